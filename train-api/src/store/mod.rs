//! Remote object storage holding published snapshots.
//!
//! The timetable feed publishes each snapshot as objects in a bucket. The
//! service only needs to list objects under a prefix and fetch their bytes;
//! `ObjectStore` captures that so tests and local runs can substitute an
//! in-memory map or a directory for S3.

mod local;
mod memory;
mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use local::LocalDirStore;
pub use memory::MemoryStore;
pub use s3::{S3Config, S3Store};

/// Metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    /// Change token; differs whenever the object's content changes.
    pub etag: Option<String>,
}

/// Errors from an object store.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("failed to list objects under {prefix:?}: {message}")]
    List { prefix: String, message: String },

    #[error("failed to fetch object {key:?}: {message}")]
    Get { key: String, message: String },

    #[error("object {0:?} not found")]
    NotFound(String),

    #[error("object store misconfigured: {0}")]
    Config(String),
}

/// Read access to a bucket of objects.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, ObjectStoreError>;

    /// Fetch the full contents of an object.
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
}
