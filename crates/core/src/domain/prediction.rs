use crate::domain::sentiment::Sentiment;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unset marker written to outcome columns until the row is reconciled.
pub const UNSET_OUTCOME: &str = "nan";

/// Written in place of a quote that could not be fetched.
pub const MISSING_QUOTE: &str = "N/A";

/// True for the placeholders a pending or missing value may carry on disk.
pub fn is_unset(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "nan" | "n/a" | "na"
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketQuotes {
    pub spx: Option<f64>,
    pub es: Option<f64>,
    pub vix: Option<f64>,
}

pub fn format_quote(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING_QUOTE.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionCall {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub reasons: Vec<String>,
}

impl DirectionCall {
    pub fn label(&self) -> String {
        format!(
            "{} {} (Confidence: {:.2})",
            self.sentiment.emoji(),
            self.sentiment.label(),
            self.confidence
        )
    }
}

/// One row of the prediction log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub quotes: MarketQuotes,
    pub sentiment_score: i32,
    pub predicted_trend: String,
    pub actual_trend: Option<Sentiment>,
    pub actual_close: Option<f64>,
    pub matched: Option<bool>,
    pub news: String,
}

impl PredictionRecord {
    /// A freshly made prediction; outcome fields stay unset until reconciliation.
    pub fn pending(
        date: NaiveDate,
        quotes: MarketQuotes,
        sentiment_score: i32,
        predicted_trend: String,
        news: String,
    ) -> Self {
        Self {
            date,
            quotes,
            sentiment_score,
            predicted_trend,
            actual_trend: None,
            actual_close: None,
            matched: None,
            news,
        }
    }

    pub fn to_row(&self) -> [String; 10] {
        [
            self.date.format("%Y-%m-%d").to_string(),
            format_quote(self.quotes.spx),
            format_quote(self.quotes.es),
            format_quote(self.quotes.vix),
            self.sentiment_score.to_string(),
            self.predicted_trend.clone(),
            self.actual_trend
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| UNSET_OUTCOME.to_string()),
            self.actual_close
                .map(|v| v.to_string())
                .unwrap_or_else(|| UNSET_OUTCOME.to_string()),
            self.matched
                .map(|m| if m { "1" } else { "0" }.to_string())
                .unwrap_or_else(|| UNSET_OUTCOME.to_string()),
            self.news.clone(),
        ]
    }
}
