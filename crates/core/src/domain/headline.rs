use crate::domain::sentiment::Classification;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Headline {
    pub text: String,
    pub link: String,
}

impl Headline {
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
        }
    }
}

impl fmt::Display for Headline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.text, self.link)
    }
}

/// A headline paired with the classification produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHeadline {
    pub headline: Headline,
    pub classification: Classification,
}

impl ScoredHeadline {
    pub fn display_line(&self) -> String {
        format!(
            "{} {} — {}",
            self.classification.sentiment.emoji(),
            self.headline,
            self.classification.reason
        )
    }
}
