//! Parsed summary body returned to clients.

use serde::{Deserialize, Serialize};

/// The three fields produced by the summarizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBody {
    /// Markdown article body.
    pub content: String,
    /// ISO-639-1 code detected by the model.
    pub lang: String,
    /// One-sentence answer to the title question.
    pub answer: String,
}

impl SummaryBody {
    pub fn new(
        content: impl Into<String>,
        lang: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            lang: lang.into(),
            answer: answer.into(),
        }
    }
}
