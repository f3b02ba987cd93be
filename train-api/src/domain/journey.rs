//! Scheduled journeys.
//!
//! A `Journey` is one running of a train from its origin to its
//! destination, with the points it passes or calls at in between.

use chrono::NaiveDate;

use super::{AtocCode, DomainError, Point, PointKind, RailTime, Rid, TrainId, TrainUid};

/// Identity and service attributes of a journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyInfo {
    pub rid: Rid,
    pub uid: TrainUid,
    pub train_id: TrainId,
    pub scheduled_start: NaiveDate,
    pub operator: AtocCode,
    /// Service type, e.g. "P" (permanent passenger) or "1" (STP passenger).
    pub status: Option<String>,
    /// Train category, e.g. "OO" (ordinary passenger) or "XX" (express).
    pub category: Option<String>,
    pub is_passenger: bool,
    pub is_q_train: bool,
    pub is_cancelled: bool,
    pub cancel_reason: Option<String>,
}

/// A scheduled journey.
///
/// Construction guarantees an origin and destination of the right kinds,
/// and that intermediate points are ordered by working arrival time with
/// points lacking one placed last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub info: JourneyInfo,
    origin: Point,
    destination: Point,
    intermediate: Vec<Point>,
}

impl Journey {
    /// Build a journey from its points.
    ///
    /// Intermediate points may be given in any order; they are stably sorted
    /// by working arrival time, with points lacking one last.
    pub fn new(
        info: JourneyInfo,
        origin: Point,
        destination: Point,
        mut intermediate: Vec<Point>,
    ) -> Result<Self, DomainError> {
        if !matches!(origin.kind, PointKind::Origin { .. }) {
            return Err(DomainError::NotAnOrigin(origin.kind.name()));
        }
        if !matches!(destination.kind, PointKind::Destination { .. }) {
            return Err(DomainError::NotADestination(destination.kind.name()));
        }
        if let Some(p) = intermediate.iter().find(|p| !p.kind.is_intermediate()) {
            return Err(DomainError::NotIntermediate(p.kind.name()));
        }

        intermediate.sort_by_key(|p| {
            let arrival = p.working_arrival();
            (arrival.is_none(), arrival)
        });

        Ok(Self {
            info,
            origin,
            destination,
            intermediate,
        })
    }

    pub fn origin(&self) -> &Point {
        &self.origin
    }

    pub fn destination(&self) -> &Point {
        &self.destination
    }

    pub fn intermediate(&self) -> &[Point] {
        &self.intermediate
    }

    /// All points: origin, intermediates in order, destination.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        std::iter::once(&self.origin)
            .chain(self.intermediate.iter())
            .chain(std::iter::once(&self.destination))
    }

    /// The origin's working departure time.
    pub fn departure(&self) -> Option<RailTime> {
        self.origin.working_departure()
    }

    /// The destination's working arrival time.
    pub fn arrival(&self) -> Option<RailTime> {
        self.destination.working_arrival()
    }

    /// Find the point at a TIPLOC.
    ///
    /// The origin is checked first, then the destination, then the first
    /// matching intermediate point.
    pub fn calling_point(&self, tiploc: &str) -> Option<&Point> {
        if self.origin.tiploc().as_str() == tiploc {
            return Some(&self.origin);
        }
        if self.destination.tiploc().as_str() == tiploc {
            return Some(&self.destination);
        }
        self.intermediate
            .iter()
            .find(|p| p.tiploc().as_str() == tiploc)
    }

    pub fn calls_at(&self, tiploc: &str) -> bool {
        self.calling_point(tiploc).is_some()
    }

    /// Whether this journey serves a pair of locations.
    ///
    /// True when it runs directly between them in either direction, or
    /// when both appear anywhere among its points.
    pub fn serves_both(&self, a: &str, b: &str) -> bool {
        let origin = self.origin.tiploc().as_str();
        let destination = self.destination.tiploc().as_str();

        (origin == a && destination == b)
            || (origin == b && destination == a)
            || (self.calls_at(a) && self.calls_at(b))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Location, Tiploc};
    use chrono::NaiveTime;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn point(index: usize, minutes: Option<u32>) -> Point {
        let location = Arc::new(Location::new(
            Tiploc::parse(&format!("P{index}")).unwrap(),
            None,
            None,
            None,
        ));
        let kind = match minutes {
            Some(m) => {
                let t = RailTime::new(date(), NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap());
                PointKind::Calling {
                    arrival: t,
                    departure: t,
                }
            }
            None => PointKind::Passing {
                passing: RailTime::new(date(), NaiveTime::MIN),
            },
        };
        Point::new(location, kind)
    }

    proptest! {
        /// Intermediate points are non-decreasing by arrival, time-less last, stable
        #[test]
        fn intermediate_order(times in proptest::collection::vec(proptest::option::of(0u32..1440), 0..30)) {
            let points: Vec<_> = times.iter().enumerate().map(|(i, t)| point(i, *t)).collect();
            let info = JourneyInfo {
                rid: Rid::new("1").unwrap(),
                uid: TrainUid::new("U").unwrap(),
                train_id: TrainId::new("1A00"),
                scheduled_start: date(),
                operator: AtocCode::parse("GW").unwrap(),
                status: None,
                category: None,
                is_passenger: true,
                is_q_train: false,
                is_cancelled: false,
                cancel_reason: None,
            };
            let origin = Point::new(
                Arc::new(Location::new(Tiploc::parse("ORIGIN").unwrap(), None, None, None)),
                PointKind::Origin { departure: RailTime::new(date(), NaiveTime::MIN), arrival: None },
            );
            let destination = Point::new(
                Arc::new(Location::new(Tiploc::parse("DEST").unwrap(), None, None, None)),
                PointKind::Destination { arrival: RailTime::new(date(), NaiveTime::MIN), departure: None },
            );
            let journey = Journey::new(info, origin, destination, points).unwrap();

            let keys: Vec<_> = journey
                .intermediate()
                .iter()
                .map(|p| (p.working_arrival().is_none(), p.working_arrival()))
                .collect();
            prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));

            // Equal keys keep their original relative order
            let indices: Vec<usize> = journey
                .intermediate()
                .iter()
                .map(|p| p.tiploc().as_str()[1..].parse().unwrap())
                .collect();
            for (w, k) in indices.windows(2).zip(keys.windows(2)) {
                if k[0] == k[1] {
                    prop_assert!(w[0] < w[1]);
                }
            }
        }
    }
}
