//! Domain error types.
//!
//! These errors represent invariant violations when assembling domain
//! values. They are distinct from parsing and IO errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The point given as a journey's origin is not an origin point
    #[error("origin must be an origin point, got {0}")]
    NotAnOrigin(&'static str),

    /// The point given as a journey's destination is not a destination point
    #[error("destination must be a destination point, got {0}")]
    NotADestination(&'static str),

    /// An intermediate point is an origin or destination
    #[error("intermediate points must be passing or calling, got {0}")]
    NotIntermediate(&'static str),
}
