//! DynamoDB article store.
//!
//! This crate provides:
//! - The [`MetadataStore`] seam over per-video article records
//! - A DynamoDB repository with conditional per-language upserts
//! - Recent-article listing through the `GSI1` index
//! - Retry with backoff and request metrics
//! - An in-memory store with the same write semantics

pub mod article_repo;
pub mod client;
pub mod error;
pub mod item;
pub mod memory;
pub mod metrics;
pub mod retry;
pub mod store;

pub use article_repo::ArticleRepository;
pub use client::{DynamoClient, DynamoConfig};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryMetadataStore;
pub use retry::RetryConfig;
pub use store::MetadataStore;
