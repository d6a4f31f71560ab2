use crate::domain::headline::Headline;
use crate::news::provider::HeadlineSource;
use crate::news::types::{FinnhubNewsItem, MarketauxResponse};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};

const FINNHUB_BASE_URL: &str = "https://finnhub.io";
const MARKETAUX_BASE_URL: &str = "https://api.marketaux.com";

// Marketaux is asked only for articles newer than this.
const MARKETAUX_LOOKBACK_HOURS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsApi {
    Finnhub,
    Marketaux,
}

/// Parses `NEWS_API_SOURCES` (comma separated). Unset means none.
pub fn parse_news_apis(raw: Option<String>) -> Vec<NewsApi> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for part in raw.split(',') {
        let api = match part.trim().to_ascii_lowercase().as_str() {
            "finnhub" => NewsApi::Finnhub,
            "marketaux" => NewsApi::Marketaux,
            "" => continue,
            other => {
                tracing::warn!(source = other, "unknown NEWS_API_SOURCES entry; ignoring");
                continue;
            }
        };
        if !out.contains(&api) {
            out.push(api);
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct FinnhubSource {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    limit: usize,
}

impl FinnhubSource {
    pub fn new(http: reqwest::Client, api_key: String, limit: usize) -> Self {
        Self::with_base_url(http, api_key, FINNHUB_BASE_URL.to_string(), limit)
    }

    pub fn with_base_url(http: reqwest::Client, api_key: String, base_url: String, limit: usize) -> Self {
        Self {
            http,
            api_key,
            base_url,
            limit,
        }
    }
}

#[async_trait::async_trait]
impl HeadlineSource for FinnhubSource {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn fetch_headlines(&self) -> Result<Vec<Headline>> {
        let url = format!("{}/api/v1/news", self.base_url.trim_end_matches('/'));
        let items = self
            .http
            .get(url)
            .query(&[("category", "general"), ("token", self.api_key.as_str())])
            .send()
            .await
            .context("Finnhub request failed")?
            .error_for_status()
            .context("Finnhub returned an error status")?
            .json::<Vec<FinnhubNewsItem>>()
            .await
            .context("failed to decode Finnhub news")?;

        Ok(items
            .into_iter()
            .take(self.limit)
            .filter(|i| !i.headline.trim().is_empty())
            .map(|i| Headline::new(i.headline.trim(), i.url))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct MarketauxSource {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    limit: usize,
}

impl MarketauxSource {
    pub fn new(http: reqwest::Client, api_key: String, limit: usize) -> Self {
        Self::with_base_url(http, api_key, MARKETAUX_BASE_URL.to_string(), limit)
    }

    pub fn with_base_url(http: reqwest::Client, api_key: String, base_url: String, limit: usize) -> Self {
        Self {
            http,
            api_key,
            base_url,
            limit,
        }
    }
}

#[async_trait::async_trait]
impl HeadlineSource for MarketauxSource {
    fn name(&self) -> &str {
        "marketaux"
    }

    async fn fetch_headlines(&self) -> Result<Vec<Headline>> {
        let published_after = (Utc::now() - Duration::hours(MARKETAUX_LOOKBACK_HOURS))
            .format("%Y-%m-%dT%H:%M")
            .to_string();
        let url = format!("{}/v1/news/all", self.base_url.trim_end_matches('/'));

        let res = self
            .http
            .get(url)
            .query(&[
                ("symbols", "SPY"),
                ("published_after", published_after.as_str()),
                ("filter_entities", "true"),
                ("language", "en"),
                ("api_token", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Marketaux request failed")?
            .error_for_status()
            .context("Marketaux returned an error status")?
            .json::<MarketauxResponse>()
            .await
            .context("failed to decode Marketaux news")?;

        Ok(res
            .data
            .into_iter()
            .take(self.limit)
            .filter(|a| !a.title.trim().is_empty())
            .map(|a| Headline::new(a.title.trim(), a.url))
            .collect())
    }
}
