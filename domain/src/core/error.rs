//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every boundary operation reports failures through this taxonomy.
/// `Conflict` is produced by compare-and-swap stores and is normally
/// absorbed by the retry loops of the vote ledger and completion gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User {user} is not a member of trip {trip}")]
    Unauthorized { trip: String, user: String },

    #[error("Concurrent modification of {0}")]
    Conflict(String),

    #[error("Phase {phase} of trip {trip} is already finalized")]
    PhaseClosed { trip: String, phase: String },

    #[error("Suggestion set of {user} in trip {trip} was already submitted")]
    AlreadySubmitted { trip: String, user: String },

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Downstream failure: {0}")]
    DownstreamFailure(String),
}

impl DomainError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        DomainError::NotFound(what.to_string())
    }

    pub fn unauthorized(trip: impl std::fmt::Display, user: impl std::fmt::Display) -> Self {
        DomainError::Unauthorized {
            trip: trip.to_string(),
            user: user.to_string(),
        }
    }

    /// Whether the caller may safely repeat the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Conflict(_) | DomainError::DownstreamFailure(_)
        )
    }

    /// Whether this error is a lost compare-and-swap race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }
}
