use crate::llm::Provider;
use std::fmt;

const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl LlmDiagnosticsError {
    /// Leading slice of the raw body, short enough for a log line.
    pub fn raw_excerpt(&self) -> Option<String> {
        self.raw_output
            .as_deref()
            .map(|raw| raw.chars().take(EXCERPT_CHARS).collect())
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={}, stage={}): {}",
            self.provider.as_str(),
            self.stage,
            self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
