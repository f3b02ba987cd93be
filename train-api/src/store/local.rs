//! Object store over a local directory.
//!
//! Object keys are paths relative to the root, using `/` separators, so a
//! directory laid out like the bucket (`PPTimetable/<name>.xml.gz`) behaves
//! the same as the bucket.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ObjectStore, ObjectStoreError, ObjectSummary};

pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn walk(&self, prefix: &str) -> std::io::Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = relative_key(&self.root, &path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let modified = metadata.modified().ok();
                let etag = modified
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| format!("{:x}-{:x}", metadata.len(), d.as_nanos()));

                objects.push(ObjectSummary {
                    key,
                    size: metadata.len(),
                    last_modified: modified.map(DateTime::<Utc>::from),
                    etag,
                });
            }
        }

        Ok(objects)
    }
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, ObjectStoreError> {
        self.walk(prefix)
            .await
            .map_err(|e| ObjectStoreError::List {
                prefix: prefix.to_string(),
                message: format!("{}: {e}", self.root.display()),
            })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        if key.split('/').any(|part| part == "..") {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        tokio::fs::read(self.root.join(key))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ObjectStoreError::NotFound(key.to_string()),
                _ => ObjectStoreError::Get {
                    key: key.to_string(),
                    message: e.to_string(),
                },
            })
    }
}
