//! Mirror published snapshot objects into the cache.
//!
//! Each object's change token is stored beside its content, so a repeated
//! synchronization only transfers objects that changed since the last run.

use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use flate2::read::MultiGzDecoder;
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::cache::{CacheKeys, KeyValueCache};
use crate::store::{ObjectStore, ObjectSummary};

use super::SyncError;

/// Cache namespace for snapshot documents.
pub const DEFAULT_NAMESPACE: &str = "darwin-push-port";

/// Synchronization settings.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Only objects whose keys start with this are mirrored.
    pub object_prefix: String,

    /// Cache namespace the documents are stored under.
    pub namespace: String,

    /// Expiry for cached documents and their change tokens.
    pub expiry: Duration,

    /// Maximum number of objects transferred at once.
    pub max_concurrent_downloads: usize,

    /// Re-fetch every object regardless of change tokens.
    pub skip_change_check: bool,
}

impl SyncConfig {
    pub fn with_object_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.object_prefix = prefix.into();
        self
    }

    pub fn with_max_concurrent_downloads(mut self, max: usize) -> Self {
        self.max_concurrent_downloads = max;
        self
    }

    pub fn with_skip_change_check(mut self, skip: bool) -> Self {
        self.skip_change_check = skip;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            object_prefix: "PPTimetable".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            expiry: Duration::from_secs(24 * 60 * 60),
            max_concurrent_downloads: 4,
            skip_change_check: false,
        }
    }
}

/// Counts from one synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub listed: usize,
    pub downloaded: usize,
    pub unchanged: usize,
    /// Objects that are not snapshot documents, or older copies of one.
    pub skipped: usize,
    /// Objects whose download or decoding failed.
    pub failed: usize,
}

/// A snapshot document identified from an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    /// File name with `.gz` and `.xml` removed, e.g. `20240315020000_v8`.
    pub base: String,
    pub compressed: bool,
}

impl SnapshotArtifact {
    /// Identify a snapshot document from its object key.
    ///
    /// Returns `None` for objects that are not XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::ingest::SnapshotArtifact;
    ///
    /// let artifact = SnapshotArtifact::classify("PPTimetable/20240315020000_v8.xml.gz").unwrap();
    /// assert_eq!(artifact.base, "20240315020000_v8");
    /// assert!(artifact.compressed);
    ///
    /// assert!(SnapshotArtifact::classify("PPTimetable/readme.txt").is_none());
    /// ```
    pub fn classify(key: &str) -> Option<Self> {
        let name = key.rsplit('/').next().unwrap_or(key);
        let (name, compressed) = match name.strip_suffix(".gz") {
            Some(stem) => (stem, true),
            None => (name, false),
        };
        let base = name.strip_suffix(".xml")?;
        if base.is_empty() {
            return None;
        }
        Some(Self {
            base: base.to_string(),
            compressed,
        })
    }
}

enum Outcome {
    Downloaded,
    Unchanged,
    Failed,
}

impl SyncReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Downloaded => self.downloaded += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Mirrors objects from a store into a cache.
pub struct Synchronizer {
    store: Arc<dyn ObjectStore>,
    cache: Arc<dyn KeyValueCache>,
    keys: CacheKeys,
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        cache: Arc<dyn KeyValueCache>,
        keys: CacheKeys,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            cache,
            keys,
            config,
        }
    }

    /// Mirror every snapshot object under the configured prefix.
    ///
    /// Objects are processed newest first. Objects that fail to download or
    /// decode are skipped; a listing failure, an object without a key, or a
    /// cache write failure aborts the batch.
    pub async fn synchronize(&self) -> Result<SyncReport, SyncError> {
        let mut objects = self.store.list(&self.config.object_prefix).await?;

        if objects.iter().any(|o| o.key.is_empty()) {
            return Err(SyncError::UndefinedKey);
        }

        // Newest first; objects without a timestamp last
        objects.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        });

        let listed = objects.len();
        let mut skipped = 0;
        let mut bases = HashSet::new();
        let mut transfers = Vec::with_capacity(objects.len());
        for object in objects {
            match SnapshotArtifact::classify(&object.key) {
                None => {
                    warn!(key = %object.key, "skipping object that is not an XML document");
                    skipped += 1;
                }
                Some(artifact) if !bases.insert(artifact.base.clone()) => {
                    // Plain and gzipped copies share a cache key; the newest wins
                    warn!(key = %object.key, base = %artifact.base, "skipping older copy of snapshot");
                    skipped += 1;
                }
                Some(artifact) => transfers.push((object, artifact)),
            }
        }

        let report = futures::stream::iter(transfers)
            .map(|(object, artifact)| self.sync_object(object, artifact))
            .buffer_unordered(self.config.max_concurrent_downloads.max(1))
            .try_fold(
                SyncReport {
                    listed,
                    skipped,
                    ..SyncReport::default()
                },
                |mut report, outcome| async move {
                    report.record(outcome);
                    Ok(report)
                },
            )
            .await?;

        info!(
            prefix = %self.config.object_prefix,
            listed = report.listed,
            downloaded = report.downloaded,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "synchronized snapshot objects"
        );
        Ok(report)
    }

    async fn sync_object(
        &self,
        object: ObjectSummary,
        artifact: SnapshotArtifact,
    ) -> Result<Outcome, SyncError> {
        let namespace = self.config.namespace.as_str();
        let content_key = self.keys.key(&[namespace, &artifact.base]);
        let etag_key = self.keys.key(&[namespace, &artifact.base, "etag"]);

        if !self.config.skip_change_check
            && self.is_unchanged(&object, &content_key, &etag_key).await?
        {
            debug!(key = %object.key, "object unchanged");
            return Ok(Outcome::Unchanged);
        }

        let bytes = match self.store.get(&object.key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %object.key, error = %e, "download failed, skipping object");
                return Ok(Outcome::Failed);
            }
        };

        let compressed = artifact.compressed;
        let decoded = tokio::task::spawn_blocking(move || decode(bytes, compressed)).await;
        let text = match decoded {
            Ok(Ok(text)) => text,
            Ok(Err(reason)) => {
                warn!(key = %object.key, %reason, "could not decode object, skipping");
                return Ok(Outcome::Failed);
            }
            Err(e) => {
                warn!(key = %object.key, error = %e, "decode task failed, skipping object");
                return Ok(Outcome::Failed);
            }
        };

        let size = text.len();
        self.cache
            .set_with_expiry(&content_key, text, self.config.expiry)
            .await?;
        if let Some(etag) = object.etag {
            self.cache
                .set_with_expiry(&etag_key, etag, self.config.expiry)
                .await?;
        }

        info!(key = %object.key, cache_key = %content_key, size, "cached snapshot object");
        Ok(Outcome::Downloaded)
    }

    /// Decide from change tokens whether an object can be skipped.
    async fn is_unchanged(
        &self,
        object: &ObjectSummary,
        content_key: &str,
        etag_key: &str,
    ) -> Result<bool, SyncError> {
        let stored = self.cache.get(etag_key).await?;

        match (object.etag.as_deref(), stored.as_deref()) {
            (Some(remote), Some(stored)) => Ok(remote == stored),
            (remote, stored) => {
                warn!(
                    key = %object.key,
                    has_remote_token = remote.is_some(),
                    has_stored_token = stored.is_some(),
                    "change token missing, falling back to content check"
                );
                Ok(self.cache.get(content_key).await?.is_some())
            }
        }
    }
}

/// Decompress if needed and decode as UTF-8.
fn decode(bytes: Vec<u8>, compressed: bool) -> Result<String, String> {
    let bytes = if compressed {
        let mut out = Vec::with_capacity(bytes.len() * 8);
        MultiGzDecoder::new(bytes.as_slice())
            .read_to_end(&mut out)
            .map_err(|e| format!("gzip: {e}"))?;
        out
    } else {
        bytes
    };
    String::from_utf8(bytes).map_err(|e| format!("utf-8: {e}"))
}
