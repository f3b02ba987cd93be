//! Journey identifiers.
//!
//! A scheduled journey is identified three ways: its train UID (stable
//! across days for a schedule), its RID (unique per running of a train)
//! and its train id, the four-character headcode shown on signalling
//! systems.

use serde::{Serialize, Serializer};
use std::fmt;

/// Error returned when an identifier is empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: cannot be empty")]
pub struct EmptyIdentifier {
    kind: &'static str,
}

macro_rules! opaque_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Box<str>);

        impl $name {
            /// Create an identifier, rejecting empty strings.
            pub fn new(s: &str) -> Result<Self, EmptyIdentifier> {
                if s.is_empty() {
                    return Err(EmptyIdentifier { kind: $kind });
                }
                Ok(Self(s.into()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }
    };
}

opaque_identifier!(
    /// A schedule's train UID (e.g. "P12345").
    ///
    /// # Examples
    ///
    /// ```
    /// use train_api::domain::TrainUid;
    ///
    /// assert_eq!(TrainUid::new("P12345").unwrap().as_str(), "P12345");
    /// assert!(TrainUid::new("").is_err());
    /// ```
    TrainUid,
    "train UID"
);

opaque_identifier!(
    /// A Darwin running identifier, unique per running of a train.
    Rid,
    "RID"
);

/// A validated train headcode (train identity).
///
/// Standard UK headcodes follow the format: digit, letter, two digits (e.g., "1A23").
/// Non-standard headcodes exist (charter trains, light engine movements) and
/// `Headcode::parse` returns `None` for them rather than an error.
///
/// # Examples
///
/// ```
/// use train_api::domain::Headcode;
///
/// let hc = Headcode::parse("1C84").unwrap();
/// assert_eq!(hc.as_str(), "1C84");
///
/// assert!(Headcode::parse("ABCD").is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Headcode([u8; 4]);

impl Headcode {
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();

        if bytes.len() != 4 {
            return None;
        }

        let standard = bytes[0].is_ascii_digit()
            && bytes[1].is_ascii_uppercase()
            && bytes[2].is_ascii_digit()
            && bytes[3].is_ascii_digit();

        standard.then(|| Headcode([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for Headcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Headcode({})", self.as_str())
    }
}

impl fmt::Display for Headcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The train id as published: always kept verbatim, with the parsed
/// headcode alongside when it has the standard shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainId {
    display: Box<str>,
    headcode: Option<Headcode>,
}

impl TrainId {
    pub fn new(s: &str) -> Self {
        Self {
            display: s.into(),
            headcode: Headcode::parse(s),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn headcode(&self) -> Option<Headcode> {
        self.headcode
    }
}

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl Serialize for TrainId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}
