pub mod anthropic;
pub mod classify;
pub mod error;
pub mod json;
pub mod openai;

use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => anyhow::bail!("unknown SENTIMENT_PROVIDER {other:?} (expected openai|anthropic)"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }
}

/// A chat model that answers one system + user exchange with plain text.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;
}

pub fn client_from_settings(settings: &Settings) -> anyhow::Result<Box<dyn LlmClient>> {
    let provider = match settings.sentiment_provider.as_deref() {
        Some(s) => Provider::parse(s)?,
        None => Provider::OpenAI,
    };

    let client: Box<dyn LlmClient> = match provider {
        Provider::OpenAI => Box::new(openai::OpenAiClient::from_settings(settings)?),
        Provider::Anthropic => Box::new(anthropic::AnthropicClient::from_settings(settings)?),
    };
    Ok(client)
}
