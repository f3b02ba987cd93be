//! The timetable aggregate and its queries.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Journey, Location, Reason, ReferenceData, Rid, Tiploc, TrainOperatingCompany};

/// A complete, immutable timetable snapshot.
///
/// Built once per refresh from a timetable document and its reference
/// document. All queries are read-only and never fail; absence is `None`
/// or an empty result.
#[derive(Debug, Clone)]
pub struct TimeTable {
    pub timetable_id: String,
    reference: ReferenceData,
    journeys: Vec<Journey>,
    journeys_by_rid: HashMap<Rid, usize>,
    journeys_by_tiploc: HashMap<Tiploc, Vec<usize>>,
}

impl TimeTable {
    pub fn new(
        timetable_id: impl Into<String>,
        reference: ReferenceData,
        journeys: Vec<Journey>,
    ) -> Self {
        let mut journeys_by_rid = HashMap::with_capacity(journeys.len());
        let mut journeys_by_tiploc: HashMap<Tiploc, Vec<usize>> = HashMap::new();

        for (index, journey) in journeys.iter().enumerate() {
            journeys_by_rid
                .entry(journey.info.rid.clone())
                .or_insert(index);

            for point in journey.points() {
                let entry = journeys_by_tiploc.entry(point.tiploc().clone()).or_default();
                // A journey visiting a location twice is indexed once
                if entry.last() != Some(&index) {
                    entry.push(index);
                }
            }
        }

        Self {
            timetable_id: timetable_id.into(),
            reference,
            journeys,
            journeys_by_rid,
            journeys_by_tiploc,
        }
    }

    pub fn reference_id(&self) -> &str {
        &self.reference.reference_id
    }

    pub fn journeys(&self) -> &[Journey] {
        &self.journeys
    }

    pub fn operators(&self) -> &[Arc<TrainOperatingCompany>] {
        self.reference.operators()
    }

    pub fn locations(&self) -> &[Arc<Location>] {
        self.reference.locations()
    }

    /// Locations that are public stations.
    pub fn stations(&self) -> impl Iterator<Item = &Arc<Location>> {
        self.locations().iter().filter(|l| l.is_station())
    }

    pub fn operator(&self, code: &str) -> Option<&Arc<TrainOperatingCompany>> {
        self.reference.operator(code)
    }

    pub fn location(&self, tiploc: &str) -> Option<&Arc<Location>> {
        self.reference.location(tiploc)
    }

    pub fn location_by_crs(&self, crs: &str) -> Option<&Arc<Location>> {
        self.reference.location_by_crs(crs)
    }

    pub fn late_running_reason(&self, code: &str) -> Option<&Reason> {
        self.reference.late_running_reason(code)
    }

    pub fn cancellation_reason(&self, code: &str) -> Option<&Reason> {
        self.reference.cancellation_reason(code)
    }

    pub fn journey_by_rid(&self, rid: &str) -> Option<&Journey> {
        let rid = Rid::new(rid).ok()?;
        self.journeys_by_rid
            .get(&rid)
            .and_then(|&index| self.journeys.get(index))
    }

    /// Journeys serving both locations.
    ///
    /// A journey matches when it runs from `a` to `b`, from `b` to `a`, or
    /// has both among its points. Results are ordered by origin working
    /// departure, with ties kept in timetable order.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::domain::{ReferenceData, TimeTable};
    ///
    /// let empty = TimeTable::new("tt", ReferenceData::new("ref"), vec![]);
    /// assert!(empty.journeys_between("PADTLL", "PLYMTH").is_empty());
    /// ```
    pub fn journeys_between(&self, a: &str, b: &str) -> Vec<&Journey> {
        let Some(candidates) = Tiploc::parse(a)
            .ok()
            .and_then(|tpl| self.journeys_by_tiploc.get(&tpl))
        else {
            return Vec::new();
        };

        let mut matches: Vec<&Journey> = candidates
            .iter()
            .filter_map(|&index| self.journeys.get(index))
            .filter(|journey| journey.serves_both(a, b))
            .collect();

        matches.sort_by_key(|journey| {
            let departure = journey.departure();
            (departure.is_none(), departure)
        });
        matches
    }
}
