use crate::domain::headline::ScoredHeadline;
use crate::domain::prediction::{DirectionCall, MarketQuotes};
use crate::domain::sentiment::Sentiment;

// Reported when nothing was classified.
const NO_NEWS_CONFIDENCE: f64 = 0.5;

pub fn total_score(news: &[ScoredHeadline]) -> i32 {
    news.iter().map(|n| n.classification.score).sum()
}

/// News-only call: the sign of `sentiment_score` picks the direction and the
/// mean headline confidence is reported alongside it.
///
/// `_quotes` is accepted so price-aware rules can be added without changing
/// callers; it does not influence the result today.
pub fn estimate_direction(
    _quotes: &MarketQuotes,
    sentiment_score: i32,
    news: &[ScoredHeadline],
) -> DirectionCall {
    let sentiment = match sentiment_score {
        s if s > 0 => Sentiment::Bullish,
        s if s < 0 => Sentiment::Bearish,
        _ => Sentiment::Neutral,
    };

    let confidence = if news.is_empty() {
        NO_NEWS_CONFIDENCE
    } else {
        news.iter().map(|n| n.classification.confidence).sum::<f64>() / news.len() as f64
    };

    tracing::debug!(
        sentiment_score,
        confidence,
        direction = sentiment.label(),
        "news-driven direction estimate"
    );

    DirectionCall {
        sentiment,
        confidence,
        reasons: vec![format!("News-driven sentiment score = {sentiment_score}")],
    }
}
