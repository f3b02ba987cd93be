//! The timetable snapshot currently served to queries.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::TimeTable;

/// Shared handle to the published timetable.
///
/// The write lock is held only for the pointer swap. Readers clone the
/// `Arc` once and keep using that snapshot for the whole query, so a
/// refresh never changes data under a running query.
#[derive(Clone, Default)]
pub struct PublishedTimeTable {
    inner: Arc<RwLock<Option<Arc<TimeTable>>>>,
}

impl PublishedTimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, or `None` before the first successful refresh.
    pub async fn current(&self) -> Option<Arc<TimeTable>> {
        self.inner.read().await.clone()
    }

    /// Replace the current snapshot, returning the one it replaced.
    pub async fn publish(&self, timetable: Arc<TimeTable>) -> Option<Arc<TimeTable>> {
        let mut guard = self.inner.write().await;
        guard.replace(timetable)
    }

    pub async fn is_ready(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
