//! Pipeline error types.

use thiserror::Error;
use vsum_dynamo::StoreError;
use vsum_models::{JobState, Language};

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type FetchResult<T> = Result<T, FetchError>;

/// HTTP or parse failure talking to a metadata or caption back-end.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Network failures, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            FetchError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Failure of an LLM completion call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LlmError {
    pub message: String,
    /// Network failures, 429 and 5xx; retried with backoff.
    pub transient: bool,
}

impl LlmError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            transient: true,
        }
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            transient: false,
        }
    }

    /// Classify an HTTP status from a provider.
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        let message = format!("{} returned {}: {}", provider, status, truncate(body, 512));
        if status == 429 || status >= 500 {
            Self::transient(message)
        } else {
            Self::permanent(message)
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LlmError::permanent(format!("Malformed provider response: {}", e))
        } else {
            LlmError::transient(format!("Provider request failed: {}", e))
        }
    }
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("Malformed summary: {0}")]
    Malformed(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl SummarizeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Top-level error of one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Summary already in progress")]
    AlreadyInFlight(Box<JobState>),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Caption unavailable for {video_id} in {lang}")]
    CaptionUnavailable { video_id: String, lang: Language },

    #[error("Caption download failed: {0}")]
    CaptionFetch(#[source] FetchError),

    #[error("LLM error: {0}")]
    Llm(#[source] LlmError),

    #[error("Malformed summary: {0}")]
    Summarize(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::AlreadyInFlight(_) => "already_in_flight",
            PipelineError::MetadataUnavailable(_) => "metadata_unavailable",
            PipelineError::CaptionUnavailable { .. } => "caption_unavailable",
            PipelineError::CaptionFetch(_) => "caption_fetch",
            PipelineError::Llm(_) => "llm",
            PipelineError::Summarize(_) => "summarize",
            PipelineError::Store(_) => "store",
            PipelineError::Config(_) => "config",
        }
    }
}

impl From<SummarizeError> for PipelineError {
    fn from(e: SummarizeError) -> Self {
        match e {
            SummarizeError::Malformed(msg) => PipelineError::Summarize(msg),
            SummarizeError::Llm(e) => PipelineError::Llm(e),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_retryable() {
        assert!(FetchError::Network("reset".into()).is_retryable());
        assert!(FetchError::status(503, "down").is_retryable());
        assert!(FetchError::status(429, "slow").is_retryable());
        assert!(!FetchError::status(404, "gone").is_retryable());
        assert!(!FetchError::parse("bad json").is_retryable());
    }

    #[test]
    fn test_llm_status_classification() {
        assert!(LlmError::from_status("deepseek", 500, "oops").transient);
        assert!(LlmError::from_status("deepseek", 429, "slow").transient);
        assert!(!LlmError::from_status("gemini", 400, "bad").transient);
        assert!(!LlmError::from_status("gemini", 401, "key").transient);
    }

    #[test]
    fn test_summarize_error_conversion() {
        let err: PipelineError = SummarizeError::malformed("missing $answer").into();
        assert_eq!(err.kind(), "summarize");
        let err: PipelineError = SummarizeError::Llm(LlmError::permanent("401")).into();
        assert_eq!(err.kind(), "llm");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ação", 2), "aç");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
