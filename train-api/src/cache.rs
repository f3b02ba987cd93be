//! Key-value cache for raw snapshot contents.
//!
//! Snapshot documents are mirrored into a keyed cache with per-key expiry,
//! alongside the change token of the object each one came from. Keys are
//! built from a configurable prefix and delimiter so several deployments
//! can share one backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;

/// Errors from a cache backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached or refused the operation
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store with per-key expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration)
    -> Result<(), CacheError>;

    /// Reset the expiry of an existing key. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// All live keys matching a glob pattern where `*` matches any run of characters.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}

/// Builds and splits namespaced cache keys.
///
/// # Examples
///
/// ```
/// use train_api::cache::CacheKeys;
///
/// let keys = CacheKeys::new("train", ":");
/// let key = keys.key(&["darwin-push-port", "20240315020000_v8"]);
/// assert_eq!(key, "train:darwin-push-port:20240315020000_v8");
///
/// assert_eq!(keys.strip(&key, "darwin-push-port"), Some("20240315020000_v8"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
    delimiter: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: delimiter.into(),
        }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Join the prefix and parts with the delimiter.
    pub fn key(&self, parts: &[&str]) -> String {
        let mut key = self.prefix.clone();
        for part in parts {
            key.push_str(&self.delimiter);
            key.push_str(part);
        }
        key
    }

    /// Glob pattern matching every key in a namespace.
    pub fn pattern(&self, namespace: &str) -> String {
        self.key(&[namespace, "*"])
    }

    /// The part of `key` after the prefix and namespace, if it belongs to
    /// that namespace.
    pub fn strip<'a>(&self, key: &'a str, namespace: &str) -> Option<&'a str> {
        let head = self.key(&[namespace, ""]);
        key.strip_prefix(head.as_str()).filter(|rest| !rest.is_empty())
    }
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new("train", ":")
    }
}

/// Match `text` against a glob where `*` matches any run of characters.
pub fn glob_matches(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No wildcard: exact match
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was stored with.
struct EntryTtl;

impl Expiry<String, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka.
pub struct MemoryCache {
    entries: MokaCache<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .build();
        Self { entries }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), CacheEntry { value, ttl })
            .await;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let Some(entry) = self.entries.get(key).await else {
            return Ok(false);
        };
        self.entries
            .insert(
                key.to_string(),
                CacheEntry {
                    value: entry.value,
                    ttl,
                },
            )
            .await;
        Ok(true)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| glob_matches(pattern, key))
            .map(|(key, _)| key.to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
