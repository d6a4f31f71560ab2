use serde::{Deserialize, Serialize};
use std::fmt;

/// Directional read of a headline or of the whole market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn score(self) -> i32 {
        match self {
            Sentiment::Bullish => 3,
            Sentiment::Bearish => -3,
            Sentiment::Neutral => 0,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Sentiment::Bullish => "📈",
            Sentiment::Bearish => "📉",
            Sentiment::Neutral => "🔹",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Bullish => "Bullish",
            Sentiment::Bearish => "Bearish",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Accepts the emoji codes the classifier is asked for as well as plain words.
    /// Anything unrecognised reads as neutral.
    pub fn from_model_output(raw: &str) -> Self {
        Self::parse_label(raw).unwrap_or(Sentiment::Neutral)
    }

    pub fn parse_label(raw: &str) -> Option<Self> {
        let s = raw.trim();
        if s.contains("📈") {
            return Some(Sentiment::Bullish);
        }
        if s.contains("📉") {
            return Some(Sentiment::Bearish);
        }
        if s.contains("🔹") {
            return Some(Sentiment::Neutral);
        }
        match s.to_ascii_lowercase().as_str() {
            "bullish" | "positive" => Some(Sentiment::Bullish),
            "bearish" | "negative" => Some(Sentiment::Bearish),
            "neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub score: i32,
    pub confidence: f64,
    pub reason: String,
}

impl Classification {
    pub fn new(sentiment: Sentiment, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            sentiment,
            score: sentiment.score(),
            confidence,
            reason: reason.into(),
        }
    }

    /// Placeholder used when a batch could not be classified.
    pub fn unclassified() -> Self {
        Self::new(Sentiment::Neutral, 0.0, "unclassified")
    }
}
