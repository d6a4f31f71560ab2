use crate::domain::headline::{Headline, ScoredHeadline};
use crate::domain::sentiment::Classification;
use crate::llm::json::{self, ParseTier};
use crate::llm::LlmClient;

pub const DEFAULT_BATCH_SIZE: usize = 10;

pub const SYSTEM_PROMPT: &str = "You are a financial sentiment classifier.\n\n\
Classify each headline as:\n\
📈 (bullish), 📉 (bearish), or 🔹 (neutral), with confidence (0.0–1.0) and a brief reason.\n\
Return exactly one entry per headline, in the order given.\n\
Respond ONLY with a JSON list like:\n\
[{\"sentiment\": \"📈\", \"confidence\": 0.8, \"reason\": \"Rate cuts expected\"}, ...]";

pub fn batch_size_from_env() -> usize {
    std::env::var("SENTIMENT_BATCH_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Classifies every headline, one model request per batch.
///
/// Never fails: a batch whose request errors or whose output cannot be parsed
/// (even after repair) is filled with [`Classification::unclassified`]. The
/// result always has one entry per input headline, in input order.
pub async fn classify_headlines(
    client: &dyn LlmClient,
    headlines: &[Headline],
    batch_size: usize,
) -> Vec<Classification> {
    let batch_size = batch_size.max(1);
    let mut out = Vec::with_capacity(headlines.len());

    for (batch_idx, chunk) in headlines.chunks(batch_size).enumerate() {
        let user = chunk
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join("\n");

        let parsed = match client.complete(SYSTEM_PROMPT, &user).await {
            Ok(text) => match json::parse_with_repair(&text) {
                Ok((items, tier)) => {
                    if tier == ParseTier::Repaired {
                        tracing::warn!(
                            batch_idx,
                            recovered = items.len(),
                            batch_len = chunk.len(),
                            "classifier output was truncated; salvaged complete records"
                        );
                    }
                    Some(items)
                }
                Err(err) => {
                    tracing::warn!(batch_idx, error = %err, "classifier output unparseable; using neutral defaults");
                    None
                }
            },
            Err(err) => {
                tracing::warn!(
                    batch_idx,
                    provider = client.provider().as_str(),
                    error = %err,
                    "classification request failed; using neutral defaults"
                );
                None
            }
        };

        let classifications: Vec<Classification> = parsed
            .map(|items| items.into_iter().map(|i| i.into_classification()).collect())
            .unwrap_or_default();
        out.extend(align_to_batch(classifications, chunk.len(), batch_idx));
    }

    out
}

/// Pads with neutral defaults or truncates so positions line up with the batch.
fn align_to_batch(
    mut classifications: Vec<Classification>,
    batch_len: usize,
    batch_idx: usize,
) -> Vec<Classification> {
    let got = classifications.len();
    if got > batch_len {
        tracing::warn!(batch_idx, got, batch_len, "classifier returned extra entries; truncating");
        classifications.truncate(batch_len);
    } else if got < batch_len && got > 0 {
        tracing::warn!(batch_idx, got, batch_len, "classifier returned too few entries; padding");
    }
    classifications.resize_with(batch_len, Classification::unclassified);
    classifications
}

pub fn zip_scored(
    headlines: Vec<Headline>,
    classifications: Vec<Classification>,
) -> Vec<ScoredHeadline> {
    headlines
        .into_iter()
        .zip(classifications)
        .map(|(headline, classification)| ScoredHeadline {
            headline,
            classification,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::Sentiment;
    use crate::llm::Provider;
    use serde_json::json;
    use std::sync::Mutex;

    /// Echoes every input line back as the reason, bullish for even lines.
    struct EchoClient {
        batches: Mutex<Vec<usize>>,
    }

    impl EchoClient {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for EchoClient {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        fn model(&self) -> &str {
            "echo"
        }

        async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String> {
            assert_eq!(system, SYSTEM_PROMPT);
            let lines: Vec<&str> = user.lines().collect();
            self.batches.lock().unwrap().push(lines.len());
            let items: Vec<_> = lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    json!({
                        "sentiment": if i % 2 == 0 { "📈" } else { "📉" },
                        "confidence": 0.5,
                        "reason": line,
                    })
                })
                .collect();
            Ok(serde_json::to_string(&items)?)
        }
    }

    struct FixedClient(Result<String, String>);

    #[async_trait::async_trait]
    impl LlmClient for FixedClient {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        fn model(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            self.0.clone().map_err(anyhow::Error::msg)
        }
    }

    fn headlines(n: usize) -> Vec<Headline> {
        (0..n)
            .map(|i| Headline::new(format!("Fed headline {i}"), format!("https://news.test/{i}")))
            .collect()
    }

    #[tokio::test]
    async fn batches_of_ten_keep_input_order() {
        let client = EchoClient::new();
        let input = headlines(23);
        let out = classify_headlines(&client, &input, 10).await;

        assert_eq!(*client.batches.lock().unwrap(), vec![10, 10, 3]);
        assert_eq!(out.len(), 23);
        for (h, c) in input.iter().zip(&out) {
            assert_eq!(c.reason, h.to_string());
        }
        assert_eq!(out[10].sentiment, Sentiment::Bullish);
        assert_eq!(out[11].sentiment, Sentiment::Bearish);
    }

    #[tokio::test]
    async fn request_failure_yields_neutral_defaults() {
        let client = FixedClient(Err("connection reset".into()));
        let out = classify_headlines(&client, &headlines(13), 10).await;
        assert_eq!(out.len(), 13);
        assert!(out.iter().all(|c| *c == Classification::unclassified()));
    }

    #[tokio::test]
    async fn malformed_output_yields_neutral_defaults() {
        let client = FixedClient(Ok("Sorry, I can't help with that.".into()));
        let out = classify_headlines(&client, &headlines(4), 10).await;
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|c| c.score == 0 && c.confidence == 0.0));
    }

    #[tokio::test]
    async fn truncated_output_is_salvaged_and_padded() {
        let text = r#"```json
[{"sentiment":"📈","confidence":0.9,"reason":"cut"},{"sentiment":"📉","confidence":0.6,"reason":"hike"},{"sentiment":"📈","conf"#;
        let client = FixedClient(Ok(text.into()));
        let out = classify_headlines(&client, &headlines(3), 10).await;
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].score, 3);
        assert_eq!(out[1].score, -3);
        assert_eq!(out[2], Classification::unclassified());
    }

    #[tokio::test]
    async fn extra_entries_are_truncated() {
        let text = r#"[{"sentiment":"📈"},{"sentiment":"📈"},{"sentiment":"📉"}]"#;
        let client = FixedClient(Ok(text.into()));
        let out = classify_headlines(&client, &headlines(2), 10).await;
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.sentiment == Sentiment::Bullish));
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let client = EchoClient::new();
        let out = classify_headlines(&client, &[], 10).await;
        assert!(out.is_empty());
        assert!(client.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn zip_pairs_positionally() {
        let scored = zip_scored(
            headlines(2),
            vec![
                Classification::new(Sentiment::Bullish, 0.9, "a"),
                Classification::new(Sentiment::Bearish, 0.1, "b"),
            ],
        );
        assert_eq!(scored[1].headline.text, "Fed headline 1");
        assert_eq!(scored[1].classification.reason, "b");
    }
}
