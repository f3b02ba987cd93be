//! Periodic rebuild of the published timetable.
//!
//! A refresh cycle mirrors the bucket into the cache, selects the newest
//! snapshot pair, builds a [`TimeTable`] from it, and swaps it in. Only one
//! cycle runs at a time, and a failed cycle leaves the previous timetable
//! published.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::darwin::MappingError;
use crate::domain::TimeTable;
use crate::ingest::{SelectError, SelectedSnapshot, SnapshotSelector, SyncError, Synchronizer};
use crate::published::PublishedTimeTable;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("synchronization failed: {0}")]
    Sync(#[from] SyncError),

    #[error("snapshot selection failed: {0}")]
    Select(#[from] SelectError),

    #[error("timetable mapping failed: {0}")]
    Mapping(#[from] MappingError),

    #[error("refresh did not finish within {0:?}")]
    TimedOut(Duration),

    /// The blocking mapping task panicked or was cancelled
    #[error("mapping task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Stage of the current (or last) refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    #[default]
    Idle,
    Synchronizing,
    Selecting,
    Mapping,
    Publishing,
    Failed,
}

/// What the last refresh cycles achieved.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    pub state: RefreshState,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub timetable_id: Option<String>,
    pub reference_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new timetable is being served
    Published {
        timetable_id: String,
        reference_id: String,
        journeys: usize,
    },
    /// Another cycle was already running; this trigger was dropped
    Coalesced,
}

/// Receives each selected snapshot pair before it is mapped.
#[async_trait]
pub trait SnapshotDump: Send + Sync {
    async fn dump(&self, snapshot: &SelectedSnapshot) -> std::io::Result<()>;
}

/// Writes selected snapshots into a directory as `<name>.xml`.
pub struct DirectoryDump {
    dir: PathBuf,
}

impl DirectoryDump {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SnapshotDump for DirectoryDump {
    async fn dump(&self, snapshot: &SelectedSnapshot) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        for document in [&snapshot.timetable, &snapshot.reference] {
            let path = self.dir.join(format!("{}.xml", document.name));
            tokio::fs::write(&path, &document.xml).await?;
            debug!(path = %path.display(), "dumped snapshot document");
        }
        Ok(())
    }
}

pub struct Refresher {
    synchronizer: Synchronizer,
    selector: SnapshotSelector,
    published: PublishedTimeTable,
    dump: Option<Arc<dyn SnapshotDump>>,
    timeout: Option<Duration>,
    status: RwLock<RefreshStatus>,
    in_flight: Mutex<()>,
}

impl Refresher {
    pub fn new(
        synchronizer: Synchronizer,
        selector: SnapshotSelector,
        published: PublishedTimeTable,
    ) -> Self {
        Self {
            synchronizer,
            selector,
            published,
            dump: None,
            timeout: None,
            status: RwLock::new(RefreshStatus::default()),
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_dump(mut self, dump: Arc<dyn SnapshotDump>) -> Self {
        self.dump = Some(dump);
        self
    }

    /// Bound the duration of a whole cycle. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn published(&self) -> &PublishedTimeTable {
        &self.published
    }

    pub async fn status(&self) -> RefreshStatus {
        self.status.read().await.clone()
    }

    async fn set_state(&self, state: RefreshState) {
        self.status.write().await.state = state;
    }

    /// Run one refresh cycle unless one is already running.
    pub async fn refresh(&self) -> Result<RefreshOutcome, RefreshError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("refresh already in progress, coalescing trigger");
            return Ok(RefreshOutcome::Coalesced);
        };

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_cycle())
                .await
                .unwrap_or(Err(RefreshError::TimedOut(limit))),
            None => self.run_cycle().await,
        };

        let mut status = self.status.write().await;
        match &result {
            Ok(RefreshOutcome::Published {
                timetable_id,
                reference_id,
                ..
            }) => {
                status.state = RefreshState::Idle;
                status.last_success = Some(Utc::now());
                status.last_error = None;
                status.timetable_id = Some(timetable_id.clone());
                status.reference_id = Some(reference_id.clone());
            }
            Ok(RefreshOutcome::Coalesced) => {}
            Err(e) => {
                error!(error = %e, "refresh failed, keeping previous timetable");
                status.state = RefreshState::Failed;
                status.last_error = Some(e.to_string());
            }
        }
        result
    }

    async fn run_cycle(&self) -> Result<RefreshOutcome, RefreshError> {
        self.set_state(RefreshState::Synchronizing).await;
        let report = self.synchronizer.synchronize().await?;
        debug!(?report, "synchronization finished");

        self.set_state(RefreshState::Selecting).await;
        let snapshot = self.selector.select().await?;

        if let Some(dump) = &self.dump {
            if let Err(e) = dump.dump(&snapshot).await {
                warn!(error = %e, "failed to dump snapshot");
            }
        }

        self.set_state(RefreshState::Mapping).await;
        let timetable = tokio::task::spawn_blocking(move || {
            TimeTable::parse(&snapshot.timetable.xml, &snapshot.reference.xml)
        })
        .await??;

        self.set_state(RefreshState::Publishing).await;
        let outcome = RefreshOutcome::Published {
            timetable_id: timetable.timetable_id.clone(),
            reference_id: timetable.reference_id().to_string(),
            journeys: timetable.journeys().len(),
        };

        if let Some(previous) = self.published.publish(Arc::new(timetable)).await {
            debug!(
                timetable_id = %previous.timetable_id,
                "released previous timetable"
            );
        }
        info!(?outcome, "published timetable");
        Ok(outcome)
    }
}
