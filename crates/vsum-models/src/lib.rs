//! Shared data models for the SumTube backend.
//!
//! This crate provides Serde-serializable types for:
//! - Supported article languages
//! - Video keys, caption tracks and provider metadata
//! - Persisted multilingual article records
//! - In-memory job lifecycle state
//! - Parsed summary bodies

pub mod article;
pub mod job_status;
pub mod language;
pub mod summary;
pub mod utils;
pub mod video;

// Re-export common types
pub use article::{ArticleRecord, ArticleStatus, LanguageFields, VideoFields};
pub use job_status::{JobMetadata, JobState, LifecycleStatus};
pub use language::{Language, LanguageError};
pub use summary::SummaryBody;
pub use utils::{extract_youtube_id, slugify, YoutubeIdError, YoutubeIdResult};
pub use video::{CaptionTrack, VideoKey, VideoMetadata};
