//! The closed error taxonomy for the memory engine.
//!
//! Every subsystem crate produces a [`PdwError`]. The kind set is closed —
//! new subsystems must map onto one of these ten kinds rather than growing
//! the enum, so callers can write exhaustive `match`es on [`ErrorKind`].

use uuid::Uuid;

/// Convenience alias used throughout the workspace.
pub type PdwResult<T> = Result<T, PdwError>;

/// The closed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    Expired,
    NotFound,
    Conflict,
    RateLimited,
    Unavailable,
    Tampered,
    Canceled,
    Internal,
}

impl ErrorKind {
    /// Whether this kind is terminal (never retried by the caller).
    ///
    /// `InvalidInput`, `Unauthorized`, `Expired`, `Tampered` are terminal.
    /// Everything else may be retried by some policy owned by the calling
    /// subsystem (`RateLimited`/`Unavailable` with backoff, `Conflict` with
    /// reload-and-retry).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidInput
                | ErrorKind::Unauthorized
                | ErrorKind::Expired
                | ErrorKind::Tampered
        )
    }
}

/// A workspace-wide error. Carries a human-readable message and, for
/// `Internal` errors, a correlation id so operators can cross-reference
/// logs without the caller-visible error leaking internals.
#[derive(Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct PdwError {
    pub kind: ErrorKind,
    pub message: String,
    pub correlation_id: Option<Uuid>,
}

impl PdwError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            correlation_id: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn tampered(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Tampered, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Canceled, message)
    }

    /// An internal error. Logs the correlation id at the call site via
    /// `tracing::error!` are the caller's responsibility; this just mints
    /// the id so it can be threaded through.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            correlation_id: Some(Uuid::new_v4()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_kinds_match_spec() {
        assert!(ErrorKind::InvalidInput.is_terminal());
        assert!(ErrorKind::Unauthorized.is_terminal());
        assert!(ErrorKind::Expired.is_terminal());
        assert!(ErrorKind::Tampered.is_terminal());
        assert!(!ErrorKind::RateLimited.is_terminal());
        assert!(!ErrorKind::Unavailable.is_terminal());
        assert!(!ErrorKind::Conflict.is_terminal());
        assert!(!ErrorKind::NotFound.is_terminal());
        assert!(!ErrorKind::Canceled.is_terminal());
        assert!(!ErrorKind::Internal.is_terminal());
    }

    #[test]
    fn internal_errors_carry_a_correlation_id() {
        let err = PdwError::internal("boom");
        assert!(err.correlation_id.is_some());
    }

    #[test]
    fn other_kinds_do_not_carry_a_correlation_id() {
        let err = PdwError::not_found("missing");
        assert!(err.correlation_id.is_none());
    }
}
