//! Ingestion error types.

use crate::cache::CacheError;
use crate::store::ObjectStoreError;

/// Errors that abort a synchronization batch.
///
/// Per-object download and decoding problems are not errors: those
/// objects are skipped and counted in the report.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The remote listing failed
    #[error("listing failed: {0}")]
    List(#[from] ObjectStoreError),

    /// The listing contained an object without a key
    #[error("listed object has an empty key")]
    UndefinedKey,

    /// Writing to the cache failed
    #[error("cache write failed: {0}")]
    Cache(#[from] CacheError),
}

/// Errors choosing the snapshot pair to build from.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    #[error("cache read failed: {0}")]
    Cache(#[from] CacheError),

    /// No cached name ends in the timetable suffix
    #[error("no timetable snapshot in cache")]
    NoTimetable,

    /// No cached name ends in the reference suffix
    #[error("no reference snapshot in cache")]
    NoReference,

    /// The chosen name's content has expired or was never written
    #[error("cached content missing for {0}")]
    MissingContent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            SyncError::UndefinedKey.to_string(),
            "listed object has an empty key"
        );
        assert_eq!(
            SelectError::MissingContent("20240315020000_v8".into()).to_string(),
            "cached content missing for 20240315020000_v8"
        );
        assert_eq!(
            SyncError::from(CacheError::Unavailable("down".into())).to_string(),
            "cache write failed: cache unavailable: down"
        );
    }
}
