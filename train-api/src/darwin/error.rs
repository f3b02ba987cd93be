//! Timetable mapping error types.

use quick_xml::events::attributes::AttrError;

use crate::domain::{DomainError, EmptyIdentifier, InvalidAtocCode, InvalidCrs, InvalidTiploc, TimeError};

/// Errors building a timetable from its XML documents.
///
/// Any of these aborts construction of the whole snapshot.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The document is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An attribute could not be read
    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),

    /// The document's root element is not the expected one
    #[error("expected root element {expected}, found {found:?}")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A required attribute is absent
    #[error("{element} is missing attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid operator code {code:?}: {source}")]
    InvalidOperatorCode {
        code: String,
        source: InvalidAtocCode,
    },

    #[error("invalid CRS {crs:?} at {tiploc}: {source}")]
    InvalidCrs {
        tiploc: String,
        crs: String,
        source: InvalidCrs,
    },

    #[error("invalid TIPLOC {tiploc:?}: {source}")]
    InvalidTiploc {
        tiploc: String,
        source: InvalidTiploc,
    },

    /// A location refers to an operator missing from the reference data
    #[error("location {tiploc} refers to unknown operator {code}")]
    UnknownOperator { tiploc: String, code: String },

    /// A journey could not be built
    #[error("journey {rid}: {source}")]
    Journey { rid: String, source: JourneyError },
}

/// Errors building a single journey.
#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error("missing attribute {0}")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    InvalidIdentifier(#[from] EmptyIdentifier),

    #[error("invalid scheduled start date {0:?}")]
    InvalidDate(String),

    #[error("invalid operator code {code:?}: {source}")]
    InvalidOperatorCode {
        code: String,
        source: InvalidAtocCode,
    },

    /// Neither `OR` nor `OPOR` is present
    #[error("no origin point")]
    MissingOrigin,

    /// Neither `DT` nor `OPDT` is present
    #[error("no destination point")]
    MissingDestination,

    #[error("{element} point has no tpl attribute")]
    MissingTiploc { element: &'static str },

    #[error("invalid TIPLOC {tiploc:?}: {source}")]
    InvalidTiploc {
        tiploc: String,
        source: InvalidTiploc,
    },

    /// A point refers to a TIPLOC missing from the reference data
    #[error("unknown location {0}")]
    UnknownLocation(String),

    /// A point lacks a working time its kind requires
    #[error("{element} point at {tiploc} is missing working time {field}")]
    MissingTime {
        element: &'static str,
        tiploc: String,
        field: &'static str,
    },

    #[error("invalid time {value:?} at {tiploc}: {source}")]
    InvalidTime {
        tiploc: String,
        value: String,
        source: TimeError,
    },

    /// `rdelay` is not a base-10 integer
    #[error("invalid route delay {value:?} at {tiploc}")]
    InvalidDelay { tiploc: String, value: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MappingError::UnknownOperator {
            tiploc: "PADTLL".into(),
            code: "ZZ".into(),
        };
        assert_eq!(
            err.to_string(),
            "location PADTLL refers to unknown operator ZZ"
        );

        let err = MappingError::Journey {
            rid: "202403157800001".into(),
            source: JourneyError::MissingOrigin,
        };
        assert_eq!(err.to_string(), "journey 202403157800001: no origin point");

        let err = JourneyError::MissingTime {
            element: "OR",
            tiploc: "PADTLL".into(),
            field: "wtd",
        };
        assert_eq!(
            err.to_string(),
            "OR point at PADTLL is missing working time wtd"
        );
    }
}
