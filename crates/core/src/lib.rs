pub mod analysis;
pub mod domain;
pub mod llm;
pub mod news;
pub mod notify;
pub mod quotes;
pub mod reconcile;
pub mod report;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_PREDICTION_LOG_PATH: &str = "market_predictions.csv";
    const DEFAULT_MARKET_TIMEZONE: &str = "America/Chicago";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub openai_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentiment_provider: Option<String>,
        pub finnhub_api_key: Option<String>,
        pub marketaux_api_key: Option<String>,
        pub email_user: Option<String>,
        pub email_pass: Option<String>,
        pub email_to: Option<String>,
        pub sentry_dsn: Option<String>,
        pub prediction_log_path: Option<String>,
        pub market_timezone: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                openai_api_key: non_empty_var("OPENAI_API_KEY"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                sentiment_provider: non_empty_var("SENTIMENT_PROVIDER"),
                finnhub_api_key: non_empty_var("FINNHUB_API_KEY"),
                marketaux_api_key: non_empty_var("MARKETAUX_API_KEY"),
                email_user: non_empty_var("EMAIL_USER"),
                email_pass: non_empty_var("EMAIL_PASS"),
                email_to: non_empty_var("EMAIL_TO"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                prediction_log_path: non_empty_var("PREDICTION_LOG_PATH"),
                market_timezone: non_empty_var("MARKET_TIMEZONE"),
            })
        }

        pub fn require_openai_api_key(&self) -> anyhow::Result<&str> {
            self.openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_email_user(&self) -> anyhow::Result<&str> {
            self.email_user.as_deref().context("EMAIL_USER is required")
        }

        pub fn require_email_pass(&self) -> anyhow::Result<&str> {
            self.email_pass.as_deref().context("EMAIL_PASS is required")
        }

        pub fn require_email_to(&self) -> anyhow::Result<&str> {
            self.email_to.as_deref().context("EMAIL_TO is required")
        }

        pub fn prediction_log_path(&self) -> PathBuf {
            PathBuf::from(
                self.prediction_log_path
                    .as_deref()
                    .unwrap_or(DEFAULT_PREDICTION_LOG_PATH),
            )
        }

        /// Reference zone that decides which calendar day a run belongs to.
        pub fn market_timezone(&self) -> anyhow::Result<chrono_tz::Tz> {
            let name = self
                .market_timezone
                .as_deref()
                .unwrap_or(DEFAULT_MARKET_TIMEZONE);
            name.parse::<chrono_tz::Tz>()
                .map_err(|e| anyhow::anyhow!("invalid MARKET_TIMEZONE {name:?}: {e}"))
        }

        /// Like [`Settings::market_timezone`], but a bad zone name only warns and
        /// the run continues on `America/Chicago`.
        pub fn market_timezone_or_default(&self) -> chrono_tz::Tz {
            self.market_timezone().unwrap_or_else(|err| {
                tracing::warn!(error = %err, fallback = DEFAULT_MARKET_TIMEZONE, "using default market timezone");
                chrono_tz::America::Chicago
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn empty() -> Settings {
            Settings {
                openai_api_key: None,
                anthropic_api_key: None,
                sentiment_provider: None,
                finnhub_api_key: None,
                marketaux_api_key: None,
                email_user: None,
                email_pass: None,
                email_to: None,
                sentry_dsn: None,
                prediction_log_path: None,
                market_timezone: None,
            }
        }

        #[test]
        fn defaults_apply_when_unset() {
            let s = empty();
            assert_eq!(s.prediction_log_path(), PathBuf::from("market_predictions.csv"));
            assert_eq!(s.market_timezone().unwrap(), chrono_tz::America::Chicago);
            assert!(s.require_openai_api_key().is_err());
        }

        #[test]
        fn rejects_unknown_timezone() {
            let s = Settings {
                market_timezone: Some("Mars/Olympus".to_string()),
                ..empty()
            };
            assert!(s.market_timezone().is_err());
            assert_eq!(s.market_timezone_or_default(), chrono_tz::America::Chicago);
        }

        #[test]
        fn valid_timezone_is_kept() {
            let s = Settings {
                market_timezone: Some("America/New_York".to_string()),
                ..empty()
            };
            assert_eq!(s.market_timezone_or_default(), chrono_tz::America::New_York);
        }
    }
}
