//! Three-state boolean attributes.

/// A boolean-like attribute that may be absent.
///
/// The feed encodes flags as the literal strings `"true"` and `"false"`;
/// anything else (including absence) is unspecified and falls back to a
/// per-attribute default.
///
/// # Examples
///
/// ```
/// use train_api::domain::Flag;
///
/// assert!(Flag::from_attr(Some("true")).resolve(false));
/// assert!(!Flag::from_attr(Some("false")).resolve(true));
/// assert!(Flag::from_attr(None).resolve(true));
/// assert!(!Flag::from_attr(Some("yes")).resolve(false));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    True,
    False,
    #[default]
    Unspecified,
}

impl Flag {
    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("true") => Flag::True,
            Some("false") => Flag::False,
            _ => Flag::Unspecified,
        }
    }

    pub fn resolve(self, default: bool) -> bool {
        match self {
            Flag::True => true,
            Flag::False => false,
            Flag::Unspecified => default,
        }
    }
}
