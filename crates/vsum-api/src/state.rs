//! Application state.

use std::sync::Arc;

use tracing::info;
use vsum_dynamo::{ArticleRepository, DynamoClient, MemoryMetadataStore, MetadataStore};
use vsum_pipeline::{JobStateCoordinator, Orchestrator, PipelineConfig};
use vsum_storage::{BlobStore, MemoryBlobStore, S3Client};

use crate::config::{ApiConfig, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Orchestrator,
    pub coordinator: Arc<JobStateCoordinator>,
    pub store: Arc<dyn MetadataStore>,
    pub blob: Arc<dyn BlobStore>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(
        config: ApiConfig,
        pipeline: &PipelineConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (blob, store): (Arc<dyn BlobStore>, Arc<dyn MetadataStore>) = match config.store_backend {
            StoreBackend::DynamoDb => {
                let blob = S3Client::from_env().await?;
                let dynamo = DynamoClient::from_env().await?;
                info!(table = %dynamo.table_name(), bucket = %blob.bucket(), "Using AWS stores");
                (Arc::new(blob), Arc::new(ArticleRepository::new(dynamo)))
            }
            StoreBackend::Memory => {
                info!("Using in-memory stores");
                (
                    Arc::new(MemoryBlobStore::new()),
                    Arc::new(MemoryMetadataStore::new()),
                )
            }
        };

        let orchestrator = Orchestrator::from_config(pipeline, blob, store)?;
        Ok(Self::from_parts(config, orchestrator))
    }

    /// Build state around an already wired orchestrator.
    pub fn from_parts(config: ApiConfig, orchestrator: Orchestrator) -> Self {
        let coordinator = Arc::clone(orchestrator.coordinator());
        let store = Arc::clone(orchestrator.store());
        let blob = Arc::clone(orchestrator.blob());
        Self {
            config,
            orchestrator,
            coordinator,
            store,
            blob,
        }
    }
}
