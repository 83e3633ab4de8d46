//! Video summarization pipeline.
//!
//! This crate provides:
//! - Metadata retrieval (watch-page scrape or Downsub API)
//! - Caption download and sanitization
//! - LLM completion clients (chat-completions and Gemini)
//! - Summary prompting, parsing and validation
//! - The process-local job state coordinator
//! - The orchestrator that runs one `(video_id, lang)` job end to end

pub mod caption;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod llm;
pub mod logging;
pub mod metadata;
pub mod metrics;
pub mod orchestrator;
pub mod retry;
pub mod summarizer;

pub use caption::{sanitize, CaptionSource, HttpCaptionFetcher};
pub use config::{LlmProviderKind, MetadataBackend, PipelineConfig};
pub use coordinator::{Admission, JobStateCoordinator};
pub use error::{FetchError, LlmError, PipelineError, PipelineResult, SummarizeError};
pub use llm::{build_llm_client, LlmClient};
pub use logging::JobLogger;
pub use metadata::{MetadataFetcher, MetadataSource};
pub use orchestrator::{Orchestrator, RunOutput};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use summarizer::{parse_summary, render_legacy, Summarizer};
