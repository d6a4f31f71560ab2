use crate::domain::prediction::MarketQuotes;
use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://www.investing.com";
const PRICE_SELECTOR: &str = r#"[data-test="instrument-price-last"]"#;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REQ_DELAY_MS: u64 = 1500;
const USER_AGENT: &str = "Mozilla/5.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    /// S&P 500 cash index.
    Spx,
    /// CBOE volatility index.
    Vix,
    /// S&P 500 e-mini futures.
    Es,
}

impl Instrument {
    pub fn path(self) -> &'static str {
        match self {
            Instrument::Spx => "/indices/us-spx-500",
            Instrument::Vix => "/indices/volatility-s-p-500",
            Instrument::Es => "/indices/us-spx-500-futures",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Instrument::Spx => "SPX",
            Instrument::Vix => "VIX",
            Instrument::Es => "ES",
        }
    }
}

#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, instrument: Instrument) -> Result<f64>;
}

/// Reads the last price off Investing.com instrument pages.
#[derive(Debug)]
pub struct InvestingQuoteClient {
    http: reqwest::Client,
    base_url: String,
    req_delay: Duration,
    requests_made: std::sync::atomic::AtomicUsize,
}

impl InvestingQuoteClient {
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("QUOTE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let req_delay_ms = std::env::var("QUOTE_REQ_DELAY_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQ_DELAY_MS);

        Self::new(base_url, Duration::from_millis(req_delay_ms))
    }

    pub fn new(base_url: String, req_delay: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build quote http client")?;

        Ok(Self {
            http,
            base_url,
            req_delay,
            requests_made: std::sync::atomic::AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl QuoteSource for InvestingQuoteClient {
    async fn fetch_quote(&self, instrument: Instrument) -> Result<f64> {
        // Fixed pause between page loads; the site throttles bursts.
        let n = self
            .requests_made
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        if n != 0 && !self.req_delay.is_zero() {
            tokio::time::sleep(self.req_delay).await;
        }

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), instrument.path());
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("{} quote page returned an error status", instrument.symbol()))?
            .text()
            .await
            .context("failed to read quote page body")?;

        parse_last_price(&body)
            .with_context(|| format!("no {} price on {url}", instrument.symbol()))
    }
}

pub fn parse_last_price(html: &str) -> Result<f64> {
    let selector = Selector::parse(PRICE_SELECTOR)
        .map_err(|e| anyhow::anyhow!("invalid price selector: {e:?}"))?;
    let doc = Html::parse_document(html);
    let el = doc
        .select(&selector)
        .next()
        .context("price element not found")?;
    let raw = el.text().collect::<String>();
    parse_price_text(&raw)
}

/// "5,123.45" -> 5123.45
pub fn parse_price_text(raw: &str) -> Result<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .with_context(|| format!("price text is not a number: {raw:?}"))
}

/// Fetches SPX, futures and VIX in turn. A failed quote is `None`.
pub async fn fetch_market_quotes(source: &dyn QuoteSource) -> MarketQuotes {
    MarketQuotes {
        spx: fetch_or_none(source, Instrument::Spx).await,
        vix: fetch_or_none(source, Instrument::Vix).await,
        es: fetch_or_none(source, Instrument::Es).await,
    }
}

pub async fn fetch_or_none(source: &dyn QuoteSource, instrument: Instrument) -> Option<f64> {
    match source.fetch_quote(instrument).await {
        Ok(price) => {
            tracing::info!(instrument = instrument.symbol(), price, "fetched quote");
            Some(price)
        }
        Err(err) => {
            tracing::warn!(instrument = instrument.symbol(), error = %err, "quote fetch failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_price_with_thousands_separator() {
        let html = r#"<div><span data-test="instrument-price-last">5,123.45</span></div>"#;
        assert_eq!(parse_last_price(html).unwrap(), 5123.45);
    }

    #[test]
    fn missing_element_is_an_error() {
        assert!(parse_last_price("<div>maintenance</div>").is_err());
        assert!(parse_price_text("--").is_err());
    }

    struct OnlyVixFails;

    #[async_trait::async_trait]
    impl QuoteSource for OnlyVixFails {
        async fn fetch_quote(&self, instrument: Instrument) -> Result<f64> {
            match instrument {
                Instrument::Spx => Ok(5000.0),
                Instrument::Es => Ok(5010.25),
                Instrument::Vix => anyhow::bail!("timeout"),
            }
        }
    }

    #[tokio::test]
    async fn failed_quote_becomes_none() {
        let q = fetch_market_quotes(&OnlyVixFails).await;
        assert_eq!(q.spx, Some(5000.0));
        assert_eq!(q.es, Some(5010.25));
        assert_eq!(q.vix, None);
    }
}
