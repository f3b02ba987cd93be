//! Scheduled points within a journey.
//!
//! A `Point` is one scheduled event at a location: the origin departure,
//! an intermediate call or pass, or the destination arrival. Which working
//! times are mandatory depends on the kind of point, so the kind carries
//! the times itself and a point cannot be built without them.

use std::sync::Arc;

use super::{Location, RailTime, Tiploc};

/// The kind of a point, carrying its working times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// First point of a journey.
    Origin {
        departure: RailTime,
        arrival: Option<RailTime>,
    },
    /// The train passes without stopping.
    Passing { passing: RailTime },
    /// The train stops.
    Calling {
        arrival: RailTime,
        departure: RailTime,
    },
    /// Last point of a journey.
    Destination {
        arrival: RailTime,
        departure: Option<RailTime>,
    },
}

impl PointKind {
    pub fn name(&self) -> &'static str {
        match self {
            PointKind::Origin { .. } => "origin",
            PointKind::Passing { .. } => "passing",
            PointKind::Calling { .. } => "calling",
            PointKind::Destination { .. } => "destination",
        }
    }

    pub fn is_intermediate(&self) -> bool {
        matches!(self, PointKind::Passing { .. } | PointKind::Calling { .. })
    }
}

/// A scheduled event at a location within one journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub location: Arc<Location>,
    pub kind: PointKind,
    /// Activity codes, e.g. "TB" (train begins) or "T " (stops to pick up and set down).
    pub activity: Option<String>,
    pub planned_activity: Option<String>,
    pub platform: Option<String>,
    pub public_arrival: Option<RailTime>,
    pub public_departure: Option<RailTime>,
    /// Delay in minutes caused by a route change.
    pub route_delay: Option<i32>,
    pub false_destination: Option<Tiploc>,
    pub is_cancelled: bool,
    /// Set for operational-only points that the public never sees.
    pub is_operational: bool,
}

impl Point {
    /// A point with only its location and working times set.
    pub fn new(location: Arc<Location>, kind: PointKind) -> Self {
        Self {
            location,
            kind,
            activity: None,
            planned_activity: None,
            platform: None,
            public_arrival: None,
            public_departure: None,
            route_delay: None,
            false_destination: None,
            is_cancelled: false,
            is_operational: false,
        }
    }

    pub fn tiploc(&self) -> &Tiploc {
        &self.location.tiploc
    }

    /// The working arrival time, if this kind of point has one.
    pub fn working_arrival(&self) -> Option<RailTime> {
        match self.kind {
            PointKind::Origin { arrival, .. } => arrival,
            PointKind::Passing { .. } => None,
            PointKind::Calling { arrival, .. } => Some(arrival),
            PointKind::Destination { arrival, .. } => Some(arrival),
        }
    }

    /// The working departure time.
    ///
    /// For a passing point this is the passing time.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use chrono::NaiveDate;
    /// use train_api::domain::{Location, Point, PointKind, RailTime, Tiploc};
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    /// let location = Arc::new(Location::new(Tiploc::parse("ROYAOJN").unwrap(), None, None, None));
    /// let passing = RailTime::parse("10:05:30", date).unwrap();
    ///
    /// let point = Point::new(location, PointKind::Passing { passing });
    /// assert_eq!(point.working_departure(), Some(passing));
    /// assert_eq!(point.working_arrival(), None);
    /// ```
    pub fn working_departure(&self) -> Option<RailTime> {
        match self.kind {
            PointKind::Origin { departure, .. } => Some(departure),
            PointKind::Passing { passing } => Some(passing),
            PointKind::Calling { departure, .. } => Some(departure),
            PointKind::Destination { departure, .. } => departure,
        }
    }

    pub fn is_passing(&self) -> bool {
        matches!(self.kind, PointKind::Passing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(s: &str) -> RailTime {
        RailTime::parse(s, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()).unwrap()
    }

    fn location(tpl: &str) -> Arc<Location> {
        Arc::new(Location::new(Tiploc::parse(tpl).unwrap(), None, None, None))
    }

    #[test]
    fn origin_times() {
        let p = Point::new(
            location("PADTLL"),
            PointKind::Origin {
                departure: at("10:00"),
                arrival: None,
            },
        );
        assert_eq!(p.working_departure(), Some(at("10:00")));
        assert_eq!(p.working_arrival(), None);
    }

    #[test]
    fn calling_times() {
        let p = Point::new(
            location("RDNGSTN"),
            PointKind::Calling {
                arrival: at("10:25"),
                departure: at("10:27"),
            },
        );
        assert_eq!(p.working_arrival(), Some(at("10:25")));
        assert_eq!(p.working_departure(), Some(at("10:27")));
        assert!(!p.is_passing());
    }

    #[test]
    fn destination_times() {
        let p = Point::new(
            location("PLYMTH"),
            PointKind::Destination {
                arrival: at("13:10"),
                departure: None,
            },
        );
        assert_eq!(p.working_arrival(), Some(at("13:10")));
        assert_eq!(p.working_departure(), None);
    }

    #[test]
    fn kind_names() {
        let passing = PointKind::Passing { passing: at("10:05") };
        assert_eq!(passing.name(), "passing");
        assert!(passing.is_intermediate());

        let origin = PointKind::Origin {
            departure: at("10:00"),
            arrival: None,
        };
        assert!(!origin.is_intermediate());
    }

    #[test]
    fn tiploc_comes_from_location() {
        let p = Point::new(location("EXETRSD"), PointKind::Passing { passing: at("12:00") });
        assert_eq!(p.tiploc().as_str(), "EXETRSD");
    }
}
