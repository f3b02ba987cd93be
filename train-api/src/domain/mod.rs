//! Domain types for the timetable.
//!
//! This module contains the core domain model types that represent
//! validated timetable data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod error;
mod flag;
mod identity;
mod journey;
mod location;
mod operator;
mod point;
mod reference;
mod time;
mod timetable;

pub use error::DomainError;
pub use flag::Flag;
pub use identity::{EmptyIdentifier, Headcode, Rid, TrainId, TrainUid};
pub use journey::{Journey, JourneyInfo};
pub use location::{Crs, InvalidCrs, InvalidTiploc, Location, Tiploc};
pub use operator::{AtocCode, InvalidAtocCode, TrainOperatingCompany};
pub use point::{Point, PointKind};
pub use reference::{Reason, ReferenceData};
pub use time::{DayClock, RailTime, TimeError, parse_time_of_day};
pub use timetable::TimeTable;
