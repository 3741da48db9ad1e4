//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Only structural misconfiguration is allowed to propagate out of the
/// core; per-call provider failures are absorbed into degraded results.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No members configured for the council")]
    EmptyRoster,

    #[error("Invalid member: {0}")]
    InvalidMember(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
