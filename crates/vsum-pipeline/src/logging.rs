//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for summarization runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use vsum_models::VideoKey;

/// Job logger for structured logging with consistent formatting.
///
/// Every event carries the video id, language and operation.
#[derive(Debug, Clone)]
pub struct JobLogger {
    video_id: String,
    lang: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for a key and operation.
    pub fn new(key: &VideoKey, operation: &str) -> Self {
        Self {
            video_id: key.video_id.clone(),
            lang: key.language.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            lang = %self.lang,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            lang = %self.lang,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            lang = %self.lang,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            lang = %self.lang,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            lang = %self.lang,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            video_id = %self.video_id,
            lang = %self.lang,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsum_models::Language;

    #[test]
    fn test_job_logger_creation() {
        let key = VideoKey::new("dQw4w9WgXcQ", Language::Es);
        let logger = JobLogger::new(&key, "summarize");

        assert_eq!(logger.video_id(), "dQw4w9WgXcQ");
        assert_eq!(logger.lang(), "es");
        assert_eq!(logger.operation(), "summarize");
    }
}
