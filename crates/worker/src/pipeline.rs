use chrono::{NaiveDate, Utc};
use preopen_core::analysis::direction::{estimate_direction, total_score};
use preopen_core::config::Settings;
use preopen_core::domain::headline::{Headline, ScoredHeadline};
use preopen_core::domain::prediction::{MarketQuotes, PredictionRecord};
use preopen_core::domain::sentiment::Classification;
use preopen_core::llm::classify::{batch_size_from_env, classify_headlines, zip_scored};
use preopen_core::news::collector::collect_headlines;
use preopen_core::quotes::{fetch_market_quotes, InvestingQuoteClient};
use preopen_core::report::Briefing;
use preopen_core::time::us_market::eastern_clock;

const MOVE_MSG: &str = "N/A";

pub async fn gather_quotes() -> MarketQuotes {
    match InvestingQuoteClient::from_env() {
        Ok(client) => fetch_market_quotes(&client).await,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::warn!(error = %err, "quote client unavailable; quotes will read N/A");
            MarketQuotes::default()
        }
    }
}

pub async fn gather_headlines(settings: &Settings) -> Vec<Headline> {
    match preopen_core::news::sources_from_settings(settings) {
        Ok(sources) => collect_headlines(&sources).await,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::warn!(error = %err, "headline sources unavailable");
            Vec::new()
        }
    }
}

pub async fn classify(settings: &Settings, headlines: Vec<Headline>) -> Vec<ScoredHeadline> {
    if headlines.is_empty() {
        return Vec::new();
    }

    let classifications = match preopen_core::llm::client_from_settings(settings) {
        Ok(client) => {
            tracing::info!(
                provider = client.provider().as_str(),
                model = client.model(),
                headlines = headlines.len(),
                "classifying headlines"
            );
            classify_headlines(client.as_ref(), &headlines, batch_size_from_env()).await
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::warn!(error = %err, "sentiment model unavailable; every headline stays neutral");
            vec![Classification::unclassified(); headlines.len()]
        }
    };

    zip_scored(headlines, classifications)
}

pub fn build_briefing(date: NaiveDate, quotes: MarketQuotes, news: Vec<ScoredHeadline>) -> (Briefing, i32) {
    let score = total_score(&news);
    let direction = estimate_direction(&quotes, score, &news);
    let briefing = Briefing {
        date,
        quotes,
        news,
        direction,
        move_msg: MOVE_MSG.to_string(),
        generated_at: eastern_clock(Utc::now()),
    };
    (briefing, score)
}

pub fn prediction_record(briefing: &Briefing, sentiment_score: i32) -> PredictionRecord {
    PredictionRecord::pending(
        briefing.date,
        briefing.quotes,
        sentiment_score,
        briefing.direction.label(),
        briefing.news_column(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use preopen_core::domain::sentiment::Sentiment;

    fn scored(sentiment: Sentiment, text: &str) -> ScoredHeadline {
        ScoredHeadline {
            headline: Headline::new(text, "https://x.test"),
            classification: Classification::new(sentiment, 0.6, "why"),
        }
    }

    #[test]
    fn record_reflects_briefing() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let quotes = MarketQuotes {
            spx: Some(5000.0),
            es: Some(5005.0),
            vix: Some(13.0),
        };
        let news = vec![
            scored(Sentiment::Bullish, "Stocks up"),
            scored(Sentiment::Bullish, "Yields down"),
            scored(Sentiment::Bearish, "Oil prices spike"),
        ];

        let (briefing, score) = build_briefing(date, quotes, news);
        assert_eq!(score, 3);
        assert_eq!(briefing.direction.sentiment, Sentiment::Bullish);

        let record = prediction_record(&briefing, score);
        let row = record.to_row();
        assert_eq!(row[0], "2026-03-02");
        assert_eq!(row[4], "3");
        assert_eq!(row[5], "📈 Bullish (Confidence: 0.60)");
        assert_eq!(row[6], "nan");
        assert_eq!(row[9].matches(" | ").count(), 2);
    }

    #[test]
    fn no_news_is_neutral() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let (briefing, score) = build_briefing(date, MarketQuotes::default(), vec![]);
        assert_eq!(score, 0);
        assert_eq!(briefing.direction.label(), "🔹 Neutral (Confidence: 0.50)");
    }
}
