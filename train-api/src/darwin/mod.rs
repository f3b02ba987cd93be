//! Darwin Push Port timetable documents.
//!
//! The Push Port publishes a daily timetable as two XML documents: the
//! timetable itself (`PportTimetable`, schema v8) listing every scheduled
//! journey, and a reference document (`PportTimetableRef`, schema v4)
//! mapping the codes it uses to operators, locations and reasons.
//!
//! Parsing happens in two stages: `xml` reads the documents into raw
//! records without validation, then `convert` resolves those records into
//! the domain model, failing on the first inconsistency.

mod convert;
mod error;
mod types;
mod xml;

pub use convert::{build_journey, build_reference, build_timetable};
pub use error::{JourneyError, MappingError};
pub use types::{
    RawJourney, RawLocation, RawOperator, RawPoint, RawPointKind, RawReason, RawReference,
    RawTimetable,
};
pub use xml::{parse_reference, parse_timetable};
