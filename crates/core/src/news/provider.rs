use crate::domain::headline::Headline;
use crate::news::relevance::is_market_relevant;
use anyhow::{Context, Result};
use reqwest::Url;
use scraper::{Html, Selector};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PER_SOURCE_LIMIT: usize = 10;
const USER_AGENT: &str = "Mozilla/5.0";

#[async_trait::async_trait]
pub trait HeadlineSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_headlines(&self) -> Result<Vec<Headline>>;
}

/// A news page scraped with a fixed CSS selector.
#[derive(Debug, Clone, Copy)]
pub struct HtmlSourceDef {
    pub name: &'static str,
    pub url: &'static str,
    pub selector: &'static str,
    pub base_url: &'static str,
}

pub const DEFAULT_HTML_SOURCES: &[HtmlSourceDef] = &[
    HtmlSourceDef {
        name: "cnbc",
        url: "https://www.cnbc.com/world/?region=world",
        selector: "a.Card-title",
        base_url: "https://www.cnbc.com",
    },
    HtmlSourceDef {
        name: "investing",
        url: "https://www.investing.com/news/stock-market-news",
        selector: "div.textDiv a.title",
        base_url: "https://www.investing.com",
    },
    HtmlSourceDef {
        name: "yahoo_finance",
        url: "https://finance.yahoo.com/",
        selector: "h3 a",
        base_url: "https://finance.yahoo.com",
    },
    HtmlSourceDef {
        name: "bloomberg",
        url: "https://www.bloomberg.com/markets",
        selector: "a.story-package-module__story__headline-link",
        base_url: "https://www.bloomberg.com",
    },
];

pub fn news_http_client() -> Result<reqwest::Client> {
    let timeout_secs = std::env::var("NEWS_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build news http client")
}

pub fn per_source_limit_from_env() -> usize {
    std::env::var("NEWS_PER_SOURCE_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_PER_SOURCE_LIMIT)
}

#[derive(Debug, Clone)]
pub struct HtmlHeadlineSource {
    http: reqwest::Client,
    name: String,
    url: String,
    selector: String,
    base_url: String,
    limit: usize,
}

impl HtmlHeadlineSource {
    pub fn new(http: reqwest::Client, def: &HtmlSourceDef, limit: usize) -> Self {
        Self::with_url(http, def, def.url.to_string(), limit)
    }

    /// Same markup rules as `def`, fetched from a different address.
    pub fn with_url(http: reqwest::Client, def: &HtmlSourceDef, url: String, limit: usize) -> Self {
        Self {
            http,
            name: def.name.to_string(),
            url,
            selector: def.selector.to_string(),
            base_url: def.base_url.to_string(),
            limit,
        }
    }

    /// First `limit` selector matches with text, links resolved, irrelevant ones dropped.
    pub fn parse_html(&self, html: &str) -> Result<Vec<Headline>> {
        let selector = Selector::parse(&self.selector)
            .map_err(|e| anyhow::anyhow!("invalid selector {:?}: {e:?}", self.selector))?;
        let doc = Html::parse_document(html);

        let mut out = Vec::new();
        for el in doc.select(&selector).take(self.limit) {
            let text = el.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() || !is_market_relevant(&text) {
                continue;
            }
            let href = el.value().attr("href").unwrap_or("");
            out.push(Headline::new(text, resolve_link(&self.base_url, href)));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl HeadlineSource for HtmlHeadlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_headlines(&self) -> Result<Vec<Headline>> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        let body = res
            .error_for_status()
            .with_context(|| format!("{} returned an error status", self.name))?
            .text()
            .await
            .context("failed to read news page body")?;

        self.parse_html(&body)
    }
}

pub fn resolve_link(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty()
        || base_url.is_empty()
        || href.starts_with("http://")
        || href.starts_with("https://")
    {
        return href.to_string();
    }

    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base_url.trim_end_matches('/'), href),
    }
}
