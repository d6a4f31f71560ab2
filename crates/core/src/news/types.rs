use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinnhubNewsItem {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketauxResponse {
    #[serde(default)]
    pub data: Vec<MarketauxArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketauxArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}
