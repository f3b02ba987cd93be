//! Snapshot ingestion: mirroring published objects into the cache and
//! choosing the newest complete pair to build a timetable from.

mod error;
mod select;
mod sync;

pub use error::{SelectError, SyncError};
pub use select::{
    REFERENCE_SUFFIX, SelectedNames, SelectedSnapshot, SnapshotDocument, SnapshotSelector,
    TIMETABLE_SUFFIX, select_names, snapshot_timestamp,
};
pub use sync::{SnapshotArtifact, SyncConfig, SyncReport, Synchronizer, DEFAULT_NAMESPACE};
