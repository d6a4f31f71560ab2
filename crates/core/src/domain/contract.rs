use crate::domain::sentiment::{Classification, Sentiment};
use serde::{Deserialize, Serialize};

/// One element of the JSON array the sentiment model is asked to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmClassification {
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Models sometimes quote the number ("0.8"); anything unreadable becomes
/// `None` instead of failing the whole array.
fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

impl LlmClassification {
    /// Lenient conversion: a missing or unknown category is neutral, a missing
    /// confidence is zero and out-of-range confidences are clamped into [0, 1].
    pub fn into_classification(self) -> Classification {
        let sentiment = self
            .sentiment
            .as_deref()
            .map(Sentiment::from_model_output)
            .unwrap_or(Sentiment::Neutral);

        let confidence = self
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let reason = self
            .reason
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Classification::new(sentiment, confidence, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_emoji_item() {
        let item: LlmClassification = serde_json::from_value(json!({
            "sentiment": "📉",
            "confidence": 0.9,
            "reason": " Hot CPI print "
        }))
        .unwrap();
        let c = item.into_classification();
        assert_eq!(c.sentiment, Sentiment::Bearish);
        assert_eq!(c.score, -3);
        assert_eq!(c.confidence, 0.9);
        assert_eq!(c.reason, "Hot CPI print");
    }

    #[test]
    fn missing_keys_fall_back_to_neutral_zero() {
        let item: LlmClassification = serde_json::from_value(json!({})).unwrap();
        let c = item.into_classification();
        assert_eq!(c.sentiment, Sentiment::Neutral);
        assert_eq!(c.confidence, 0.0);
        assert_eq!(c.reason, "");
    }

    #[test]
    fn clamps_confidence() {
        let item: LlmClassification =
            serde_json::from_value(json!({"sentiment": "📈", "confidence": 1.7})).unwrap();
        assert_eq!(item.into_classification().confidence, 1.0);
    }

    #[test]
    fn quoted_confidence_is_read_and_junk_is_zero() {
        let item: LlmClassification =
            serde_json::from_value(json!({"sentiment": "bullish", "confidence": " 0.65 "})).unwrap();
        assert_eq!(item.into_classification().confidence, 0.65);

        let item: LlmClassification =
            serde_json::from_value(json!({"sentiment": "📉", "confidence": "high"})).unwrap();
        assert_eq!(item.into_classification().confidence, 0.0);

        let item: LlmClassification =
            serde_json::from_value(json!({"confidence": null})).unwrap();
        assert_eq!(item.into_classification().confidence, 0.0);
    }
}
