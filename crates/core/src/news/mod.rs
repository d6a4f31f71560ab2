pub mod api;
pub mod collector;
pub mod provider;
pub mod relevance;
pub mod types;

use crate::config::Settings;
use crate::news::api::{FinnhubSource, MarketauxSource, NewsApi};
use crate::news::provider::{HeadlineSource, HtmlHeadlineSource, DEFAULT_HTML_SOURCES};

/// The scraped pages, plus whichever JSON APIs `NEWS_API_SOURCES` enables.
pub fn sources_from_settings(settings: &Settings) -> anyhow::Result<Vec<Box<dyn HeadlineSource>>> {
    let http = provider::news_http_client()?;
    let limit = provider::per_source_limit_from_env();

    let mut sources: Vec<Box<dyn HeadlineSource>> = DEFAULT_HTML_SOURCES
        .iter()
        .map(|def| Box::new(HtmlHeadlineSource::new(http.clone(), def, limit)) as Box<dyn HeadlineSource>)
        .collect();

    for api in api::parse_news_apis(std::env::var("NEWS_API_SOURCES").ok()) {
        match api {
            NewsApi::Finnhub => match settings.finnhub_api_key.clone() {
                Some(key) => sources.push(Box::new(FinnhubSource::new(http.clone(), key, limit))),
                None => tracing::warn!("finnhub enabled but FINNHUB_API_KEY is missing; skipping"),
            },
            NewsApi::Marketaux => match settings.marketaux_api_key.clone() {
                Some(key) => sources.push(Box::new(MarketauxSource::new(http.clone(), key, limit))),
                None => tracing::warn!("marketaux enabled but MARKETAUX_API_KEY is missing; skipping"),
            },
        }
    }

    Ok(sources)
}
