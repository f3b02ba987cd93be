//! Train operating companies.

use serde::{Serialize, Serializer};
use std::fmt;

/// Error returned when parsing an invalid ATOC code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ATOC code: {reason}")]
pub struct InvalidAtocCode {
    reason: &'static str,
}

/// A valid 2-character ATOC operator code.
///
/// ATOC codes identify train operating companies (e.g., "GW" for Great
/// Western Railway, "XC" for CrossCountry). Darwin uses uppercase letters
/// and, for a handful of non-passenger operators, digits.
///
/// # Examples
///
/// ```
/// use train_api::domain::AtocCode;
///
/// let xc = AtocCode::parse("XC").unwrap();
/// assert_eq!(xc.as_str(), "XC");
///
/// assert!(AtocCode::parse("xc").is_err());
/// assert!(AtocCode::parse("XCR").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtocCode([u8; 2]);

impl AtocCode {
    /// Parse an ATOC code from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidAtocCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 2 {
            return Err(InvalidAtocCode {
                reason: "must be exactly 2 characters",
            });
        }

        if !bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidAtocCode {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        Ok(AtocCode([bytes[0], bytes[1]]))
    }

    /// Returns the ATOC code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for AtocCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtocCode({})", self.as_str())
    }
}

impl fmt::Display for AtocCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AtocCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A train operating company from the reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainOperatingCompany {
    pub code: AtocCode,
    pub name: String,
    pub url: Option<String>,
}
