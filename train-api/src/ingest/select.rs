//! Choose the newest timetable and reference snapshots from the cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::cache::{CacheKeys, KeyValueCache};

use super::SelectError;

/// Name suffix of full timetable snapshots.
pub const TIMETABLE_SUFFIX: &str = "_v8";

/// Name suffix of reference snapshots.
pub const REFERENCE_SUFFIX: &str = "_ref_v4";

const TIMESTAMP_LEN: usize = 14;

/// Timestamp embedded at the start of a snapshot name.
///
/// # Examples
///
/// ```
/// use train_api::ingest::snapshot_timestamp;
///
/// let ts = snapshot_timestamp("20240315020000_v8").unwrap();
/// assert_eq!(ts.to_string(), "2024-03-15 02:00:00");
/// assert!(snapshot_timestamp("latest_v8").is_none());
/// ```
pub fn snapshot_timestamp(name: &str) -> Option<NaiveDateTime> {
    let prefix = name.get(..TIMESTAMP_LEN)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(prefix, "%Y%m%d%H%M%S").ok()
}

/// True if `name` ends in `suffix` immediately preceded by a digit.
fn has_suffix(name: &str, suffix: &str) -> bool {
    name.strip_suffix(suffix)
        .and_then(|stem| stem.bytes().last())
        .is_some_and(|b| b.is_ascii_digit())
}

/// The chosen pair of snapshot names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNames {
    pub timetable: String,
    pub reference: String,
}

/// Pick the newest timetable and reference names.
///
/// Names are ordered by their embedded timestamp, newest first, with ties
/// broken by name so the choice does not depend on input order. Names
/// without a timestamp are ignored.
pub fn select_names<I, S>(names: I) -> Result<SelectedNames, SelectError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = names
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .collect();

    let mut dated: Vec<(NaiveDateTime, String)> = unique
        .into_iter()
        .filter_map(|name| match snapshot_timestamp(&name) {
            Some(ts) => Some((ts, name)),
            None => {
                debug!(%name, "ignoring snapshot name without timestamp");
                None
            }
        })
        .collect();
    dated.sort_by(|a, b| b.cmp(a));

    let newest = |suffix: &str| {
        dated
            .iter()
            .find(|(_, name)| has_suffix(name, suffix))
            .map(|(_, name)| name.clone())
    };

    let timetable = newest(TIMETABLE_SUFFIX).ok_or(SelectError::NoTimetable)?;
    let reference = newest(REFERENCE_SUFFIX).ok_or(SelectError::NoReference)?;
    Ok(SelectedNames {
        timetable,
        reference,
    })
}

/// A cached snapshot document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDocument {
    pub name: String,
    pub xml: String,
}

/// The newest timetable and reference documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedSnapshot {
    pub timetable: SnapshotDocument,
    pub reference: SnapshotDocument,
}

/// Reads the newest snapshot pair back out of the cache.
pub struct SnapshotSelector {
    cache: Arc<dyn KeyValueCache>,
    keys: CacheKeys,
    namespace: String,
}

impl SnapshotSelector {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        keys: CacheKeys,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            keys,
            namespace: namespace.into(),
        }
    }

    /// Base names of cached snapshots. A change-token key names its
    /// snapshot too, so a snapshot whose content expired first is still
    /// listed and fails at fetch time.
    async fn cached_names(&self) -> Result<Vec<String>, SelectError> {
        let etag_suffix = format!("{}etag", self.keys.delimiter());
        let keys = self.cache.keys(&self.keys.pattern(&self.namespace)).await?;
        Ok(keys
            .iter()
            .filter_map(|key| self.keys.strip(key, &self.namespace))
            .map(|name| name.strip_suffix(etag_suffix.as_str()).unwrap_or(name))
            .map(String::from)
            .collect())
    }

    async fn document(&self, name: String) -> Result<SnapshotDocument, SelectError> {
        let key = self.keys.key(&[&self.namespace, &name]);
        match self.cache.get(&key).await? {
            Some(xml) => Ok(SnapshotDocument { name, xml }),
            None => Err(SelectError::MissingContent(name)),
        }
    }

    pub async fn select(&self) -> Result<SelectedSnapshot, SelectError> {
        let names = select_names(self.cached_names().await?)?;
        info!(
            timetable = %names.timetable,
            reference = %names.reference,
            "selected snapshot pair"
        );

        Ok(SelectedSnapshot {
            timetable: self.document(names.timetable).await?,
            reference: self.document(names.reference).await?,
        })
    }
}
