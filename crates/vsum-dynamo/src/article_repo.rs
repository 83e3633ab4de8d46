//! Article repository backed by DynamoDB.

use async_trait::async_trait;
use tracing::{debug, info};
use vsum_models::{ArticleRecord, ArticleStatus, Language, LanguageFields, VideoFields};

use crate::client::DynamoClient;
use crate::error::StoreResult;
use crate::item::{ensure_item_plan, failure_plan, item_to_record, language_plan};
use crate::store::MetadataStore;

/// Repository for per-video article items.
#[derive(Clone)]
pub struct ArticleRepository {
    client: DynamoClient,
}

impl ArticleRepository {
    /// Create a new article repository.
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DynamoClient {
        &self.client
    }
}

#[async_trait]
impl MetadataStore for ArticleRepository {
    async fn upsert_language(
        &self,
        video_id: &str,
        lang: Language,
        fields: &LanguageFields,
        video: &VideoFields,
    ) -> StoreResult<()> {
        self.client
            .update("ensure_item", video_id, &ensure_item_plan(Some(video)))
            .await?;

        let now = ArticleRecord::now_timestamp();
        self.client
            .update("upsert_language", video_id, &language_plan(lang, fields, &now))
            .await?;

        info!(video_id = %video_id, lang = %lang, "Upserted article language");
        Ok(())
    }

    async fn mark_failed(
        &self,
        video_id: &str,
        lang: Language,
        status: ArticleStatus,
    ) -> StoreResult<()> {
        self.client
            .update("ensure_item", video_id, &ensure_item_plan(None))
            .await?;

        match self
            .client
            .update("mark_failed", video_id, &failure_plan(lang, status))
            .await
        {
            Ok(()) => {
                info!(video_id = %video_id, lang = %lang, status = %status, "Recorded terminal status");
                Ok(())
            }
            Err(e) if e.is_condition_failed() => {
                debug!(video_id = %video_id, lang = %lang, "Language already completed, status kept");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn get(&self, video_id: &str) -> StoreResult<Option<ArticleRecord>> {
        match self.client.get_item(video_id).await? {
            Some(item) => Ok(Some(item_to_record(&item)?)),
            None => Ok(None),
        }
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<ArticleRecord>> {
        self.client
            .query_recent(limit)
            .await?
            .iter()
            .map(item_to_record)
            .collect()
    }

    async fn check_ready(&self) -> StoreResult<()> {
        self.client.check_connectivity().await
    }
}
