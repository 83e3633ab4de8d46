//! Article store seam.

use async_trait::async_trait;
use vsum_models::{ArticleRecord, ArticleStatus, Language, LanguageFields, VideoFields};

use crate::error::StoreResult;

/// Read/write access to durable per-video article records.
///
/// Writes for different languages of one video never overlap in the fields
/// they touch, so concurrent writers for distinct languages both land.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Set every `*[lang]` sub-field and fill video-level fields that are
    /// still absent. Other languages are left untouched.
    async fn upsert_language(
        &self,
        video_id: &str,
        lang: Language,
        fields: &LanguageFields,
        video: &VideoFields,
    ) -> StoreResult<()>;

    /// Write `status[lang]` only, creating the record if needed.
    ///
    /// A language that is already completed keeps its status.
    async fn mark_failed(
        &self,
        video_id: &str,
        lang: Language,
        status: ArticleStatus,
    ) -> StoreResult<()>;

    async fn get(&self, video_id: &str) -> StoreResult<Option<ArticleRecord>>;

    /// Most recently updated records first.
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ArticleRecord>>;

    /// Reachability check used by the readiness endpoint.
    async fn check_ready(&self) -> StoreResult<()> {
        Ok(())
    }
}
