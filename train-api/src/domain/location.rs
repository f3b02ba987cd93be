//! Locations and their codes.
//!
//! Every point in the timetable refers to a timing point by its TIPLOC.
//! Only some timing points are public stations with a CRS code.

use super::TrainOperatingCompany;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Error returned when parsing an invalid CRS code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CRS code: {reason}")]
pub struct InvalidCrs {
    reason: &'static str,
}

/// A valid 3-letter CRS (Computer Reservation System) station code.
///
/// CRS codes are always 3 uppercase ASCII letters. This type guarantees
/// that any `Crs` value is valid by construction.
///
/// # Examples
///
/// ```
/// use train_api::domain::Crs;
///
/// let pad = Crs::parse("PAD").unwrap();
/// assert_eq!(pad.as_str(), "PAD");
///
/// assert!(Crs::parse("pad").is_err());
/// assert!(Crs::parse("PA").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Crs([u8; 3]);

impl Crs {
    /// Parse a CRS code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters (A-Z).
    pub fn parse(s: &str) -> Result<Self, InvalidCrs> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidCrs {
                reason: "must be exactly 3 characters",
            });
        }

        if !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(InvalidCrs {
                reason: "must be uppercase ASCII letters A-Z",
            });
        }

        Ok(Crs([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the CRS code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Crs({})", self.as_str())
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Crs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when parsing an invalid TIPLOC.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid TIPLOC: {reason}")]
pub struct InvalidTiploc {
    reason: &'static str,
}

/// A timing point location code.
///
/// TIPLOCs are short (up to 7 characters) identifiers for any place a
/// train can be timed at: stations, junctions, sidings.
///
/// # Examples
///
/// ```
/// use train_api::domain::Tiploc;
///
/// let pad = Tiploc::parse("PADTLL").unwrap();
/// assert_eq!(pad.as_str(), "PADTLL");
///
/// assert!(Tiploc::parse("").is_err());
/// assert!(Tiploc::parse("TOOLONGX").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tiploc(Box<str>);

impl Tiploc {
    const MAX_LEN: usize = 7;

    /// Parse a TIPLOC from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidTiploc> {
        if s.is_empty() {
            return Err(InvalidTiploc {
                reason: "cannot be empty",
            });
        }
        if s.len() > Self::MAX_LEN {
            return Err(InvalidTiploc {
                reason: "must be at most 7 characters",
            });
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(InvalidTiploc {
                reason: "must be printable ASCII without spaces",
            });
        }
        Ok(Tiploc(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Tiploc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tiploc({})", self.as_str())
    }
}

impl fmt::Display for Tiploc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Tiploc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A timing point from the reference data.
///
/// Locations are built once per snapshot and shared between every point
/// that refers to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub tiploc: Tiploc,
    pub crs: Option<Crs>,
    /// Display name, absent when the reference data only repeats the TIPLOC.
    pub name: Option<String>,
    pub operator: Option<Arc<TrainOperatingCompany>>,
}

impl Location {
    /// Build a location, dropping a display name that merely repeats the
    /// TIPLOC.
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::domain::{Crs, Location, Tiploc};
    ///
    /// let junction = Location::new(Tiploc::parse("ROYAOJN").unwrap(), None, Some("ROYAOJN".into()), None);
    /// assert_eq!(junction.name, None);
    /// assert!(!junction.is_station());
    ///
    /// let station = Location::new(
    ///     Tiploc::parse("PADTLL").unwrap(),
    ///     Some(Crs::parse("PAD").unwrap()),
    ///     Some("London Paddington".into()),
    ///     None,
    /// );
    /// assert!(station.is_station());
    /// ```
    pub fn new(
        tiploc: Tiploc,
        crs: Option<Crs>,
        name: Option<String>,
        operator: Option<Arc<TrainOperatingCompany>>,
    ) -> Self {
        let name = name.filter(|n| !n.is_empty() && n != tiploc.as_str());
        Self {
            tiploc,
            crs,
            name,
            operator,
        }
    }

    /// A location is a public station when it has both a CRS code and a
    /// display name distinct from its TIPLOC.
    pub fn is_station(&self) -> bool {
        self.crs.is_some() && self.name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AtocCode;

    #[test]
    fn parse_valid_crs() {
        assert!(Crs::parse("PAD").is_ok());
        assert!(Crs::parse("PLY").is_ok());
        assert!(Crs::parse("ZZZ").is_ok());
    }

    #[test]
    fn reject_invalid_crs() {
        assert!(Crs::parse("").is_err());
        assert!(Crs::parse("pad").is_err());
        assert!(Crs::parse("P4D").is_err());
        assert!(Crs::parse("PADD").is_err());
        assert!(Crs::parse("PÄD").is_err());
    }

    #[test]
    fn crs_display_and_debug() {
        let crs = Crs::parse("RDG").unwrap();
        assert_eq!(crs.to_string(), "RDG");
        assert_eq!(format!("{crs:?}"), "Crs(RDG)");
    }

    #[test]
    fn parse_valid_tiploc() {
        assert!(Tiploc::parse("PADTLL").is_ok());
        assert!(Tiploc::parse("RDNGSTN").is_ok());
        assert!(Tiploc::parse("X").is_ok());
        assert!(Tiploc::parse("CLPHMJ2").is_ok());
    }

    #[test]
    fn reject_invalid_tiploc() {
        assert!(Tiploc::parse("").is_err());
        assert!(Tiploc::parse("ABCDEFGH").is_err());
        assert!(Tiploc::parse("PAD TLL").is_err());
    }

    #[test]
    fn name_equal_to_tiploc_is_dropped() {
        let loc = Location::new(
            Tiploc::parse("ROYAOJN").unwrap(),
            None,
            Some("ROYAOJN".to_string()),
            None,
        );
        assert_eq!(loc.name, None);
    }

    #[test]
    fn station_requires_crs_and_name() {
        let tiploc = Tiploc::parse("PADTLL").unwrap();
        let crs = Crs::parse("PAD").unwrap();

        let both = Location::new(tiploc.clone(), Some(crs), Some("London Paddington".into()), None);
        let no_crs = Location::new(tiploc.clone(), None, Some("London Paddington".into()), None);
        let no_name = Location::new(tiploc.clone(), Some(crs), None, None);
        let name_is_tiploc = Location::new(tiploc, Some(crs), Some("PADTLL".into()), None);

        assert!(both.is_station());
        assert!(!no_crs.is_station());
        assert!(!no_name.is_station());
        assert!(!name_is_tiploc.is_station());
    }

    #[test]
    fn operator_is_shared() {
        let gw = Arc::new(TrainOperatingCompany {
            code: AtocCode::parse("GW").unwrap(),
            name: "Great Western Railway".into(),
            url: None,
        });
        let loc = Location::new(
            Tiploc::parse("PADTLL").unwrap(),
            None,
            None,
            Some(Arc::clone(&gw)),
        );
        assert!(Arc::ptr_eq(loc.operator.as_ref().unwrap(), &gw));
    }
}
