//! Caption blob storage.
//!
//! This crate provides:
//! - An S3 client for writing raw caption files
//! - The [`BlobStore`] seam used by the summarization pipeline
//! - An in-memory store for tests and local runs

pub mod blob;
pub mod client;
pub mod error;

pub use blob::{caption_key, BlobStore, MemoryBlobStore, StoredObject, CAPTION_CONTENT_TYPE};
pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
