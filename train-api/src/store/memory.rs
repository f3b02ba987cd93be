//! In-memory object store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ObjectStore, ObjectStoreError, ObjectSummary};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

/// Object store held in memory, counting fetches.
///
/// Useful for seeding a service from fixed documents and for observing
/// how many transfers a synchronization performed.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    fail_listing: AtomicBool,
    gets: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, replacing any previous one at `key`.
    pub async fn put(
        &self,
        key: impl Into<String>,
        data: impl Into<Vec<u8>>,
        etag: Option<&str>,
        last_modified: Option<DateTime<Utc>>,
    ) {
        self.objects.write().await.insert(
            key.into(),
            StoredObject {
                data: data.into(),
                etag: etag.map(String::from),
                last_modified,
            },
        );
    }

    /// Make subsequent listings fail.
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `get` calls so far.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, ObjectStoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::List {
                prefix: prefix.to_string(),
                message: "listing disabled".into(),
            });
        }

        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: object.last_modified,
                etag: object.etag.clone(),
            })
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let objects = self.objects.read().await;
        let object = objects
            .get(key)
            .ok_or_else(|| ObjectStoreError::NotFound(key.to_string()))?;
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(object.data.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_list_get() {
        let store = MemoryStore::new();
        store.put("PPTimetable/a.xml", "<a/>", Some("e1"), None).await;
        store.put("Other/b.xml", "<b/>", None, None).await;

        let listed = store.list("PPTimetable").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].etag.as_deref(), Some("e1"));

        assert_eq!(store.get("PPTimetable/a.xml").await.unwrap(), b"<a/>");
        assert_eq!(store.get_count(), 1);
        assert!(store.get("missing").await.is_err());
        assert_eq!(store.get_count(), 1);
    }

    #[tokio::test]
    async fn listing_can_fail() {
        let store = MemoryStore::new();
        store.set_fail_listing(true);
        assert!(store.list("").await.is_err());
    }
}
