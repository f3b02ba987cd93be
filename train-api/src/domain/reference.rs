//! Reference data: operators, locations and reason codes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::{AtocCode, Crs, Location, Tiploc, TrainOperatingCompany};

/// A late-running or cancellation reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reason {
    pub code: String,
    pub text: String,
}

/// Lookup tables built from a reference document.
///
/// Insertion order is preserved for listing; lookups go through indexes.
/// The first entry for a code wins and later duplicates are rejected.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub reference_id: String,
    operators: Vec<Arc<TrainOperatingCompany>>,
    operators_by_code: HashMap<AtocCode, Arc<TrainOperatingCompany>>,
    locations: Vec<Arc<Location>>,
    locations_by_tiploc: HashMap<Tiploc, Arc<Location>>,
    locations_by_crs: HashMap<Crs, Vec<Arc<Location>>>,
    late_running_reasons: HashMap<String, Reason>,
    cancellation_reasons: HashMap<String, Reason>,
}

impl ReferenceData {
    pub fn new(reference_id: impl Into<String>) -> Self {
        Self {
            reference_id: reference_id.into(),
            ..Self::default()
        }
    }

    /// Add an operator. Returns false if the code was already present.
    pub fn insert_operator(&mut self, operator: TrainOperatingCompany) -> bool {
        if self.operators_by_code.contains_key(&operator.code) {
            return false;
        }
        let operator = Arc::new(operator);
        self.operators_by_code
            .insert(operator.code, Arc::clone(&operator));
        self.operators.push(operator);
        true
    }

    /// Add a location. Returns false if the TIPLOC was already present.
    pub fn insert_location(&mut self, location: Location) -> bool {
        if self.locations_by_tiploc.contains_key(&location.tiploc) {
            return false;
        }
        let location = Arc::new(location);
        self.locations_by_tiploc
            .insert(location.tiploc.clone(), Arc::clone(&location));
        if let Some(crs) = location.crs {
            self.locations_by_crs
                .entry(crs)
                .or_default()
                .push(Arc::clone(&location));
        }
        self.locations.push(location);
        true
    }

    pub fn insert_late_running_reason(&mut self, reason: Reason) -> bool {
        insert_reason(&mut self.late_running_reasons, reason)
    }

    pub fn insert_cancellation_reason(&mut self, reason: Reason) -> bool {
        insert_reason(&mut self.cancellation_reasons, reason)
    }

    pub fn operators(&self) -> &[Arc<TrainOperatingCompany>] {
        &self.operators
    }

    pub fn operator(&self, code: &str) -> Option<&Arc<TrainOperatingCompany>> {
        let code = AtocCode::parse(code).ok()?;
        self.operators_by_code.get(&code)
    }

    pub fn locations(&self) -> &[Arc<Location>] {
        &self.locations
    }

    pub fn location(&self, tiploc: &str) -> Option<&Arc<Location>> {
        let tiploc = Tiploc::parse(tiploc).ok()?;
        self.locations_by_tiploc.get(&tiploc)
    }

    /// The first location carrying a CRS code, preferring public stations.
    ///
    /// Several TIPLOCs can share one CRS (large stations are often split
    /// into platform groups).
    pub fn location_by_crs(&self, crs: &str) -> Option<&Arc<Location>> {
        let crs = Crs::parse(crs).ok()?;
        let candidates = self.locations_by_crs.get(&crs)?;
        candidates
            .iter()
            .find(|l| l.is_station())
            .or_else(|| candidates.first())
    }

    pub fn late_running_reason(&self, code: &str) -> Option<&Reason> {
        self.late_running_reasons.get(code)
    }

    pub fn cancellation_reason(&self, code: &str) -> Option<&Reason> {
        self.cancellation_reasons.get(code)
    }
}

fn insert_reason(reasons: &mut HashMap<String, Reason>, reason: Reason) -> bool {
    if reasons.contains_key(&reason.code) {
        return false;
    }
    reasons.insert(reason.code.clone(), reason);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator(code: &str, name: &str) -> TrainOperatingCompany {
        TrainOperatingCompany {
            code: AtocCode::parse(code).unwrap(),
            name: name.into(),
            url: None,
        }
    }

    fn location(tpl: &str, crs: Option<&str>, name: Option<&str>) -> Location {
        Location::new(
            Tiploc::parse(tpl).unwrap(),
            crs.map(|c| Crs::parse(c).unwrap()),
            name.map(String::from),
            None,
        )
    }

    #[test]
    fn first_operator_wins() {
        let mut reference = ReferenceData::new("ref");
        assert!(reference.insert_operator(operator("XC", "CrossCountry")));
        assert!(!reference.insert_operator(operator("XC", "Duplicate")));

        assert_eq!(reference.operator("XC").unwrap().name, "CrossCountry");
        assert_eq!(reference.operators().len(), 1);
    }

    #[test]
    fn first_location_wins() {
        let mut reference = ReferenceData::new("ref");
        assert!(reference.insert_location(location("PADTLL", Some("PAD"), Some("London Paddington"))));
        assert!(!reference.insert_location(location("PADTLL", None, Some("Other"))));

        let pad = reference.location("PADTLL").unwrap();
        assert_eq!(pad.name.as_deref(), Some("London Paddington"));
    }

    #[test]
    fn crs_lookup_prefers_stations() {
        let mut reference = ReferenceData::new("ref");
        reference.insert_location(location("CLPHMJC", Some("CLJ"), None));
        reference.insert_location(location("CLPHMJM", Some("CLJ"), Some("Clapham Junction")));

        let clj = reference.location_by_crs("CLJ").unwrap();
        assert_eq!(clj.tiploc.as_str(), "CLPHMJM");
        assert!(reference.location_by_crs("PAD").is_none());
    }

    #[test]
    fn invalid_codes_find_nothing() {
        let reference = ReferenceData::new("ref");
        assert!(reference.operator("gw").is_none());
        assert!(reference.location("").is_none());
        assert!(reference.location_by_crs("pad").is_none());
    }

    #[test]
    fn reasons_by_code() {
        let mut reference = ReferenceData::new("ref");
        reference.insert_cancellation_reason(Reason {
            code: "100".into(),
            text: "This train has been cancelled because of a broken down train".into(),
        });
        reference.insert_late_running_reason(Reason {
            code: "100".into(),
            text: "This train has been delayed by a broken down train".into(),
        });

        assert!(reference.cancellation_reason("100").unwrap().text.contains("cancelled"));
        assert!(reference.late_running_reason("100").unwrap().text.contains("delayed"));
        assert!(reference.late_running_reason("999").is_none());
    }
}
