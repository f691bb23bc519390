//! Error types for the data-session core.

/// Session result type
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by the data-session controller and its parts
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("bearer pool exhausted")]
    PoolExhausted,

    #[error("unknown bearer: {id}")]
    UnknownBearer { id: usize },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("controller unavailable: {message}")]
    ControllerUnavailable { message: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl SessionError {
    pub fn invariant(message: impl Into<String>) -> Self {
        SessionError::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn controller_unavailable(message: impl Into<String>) -> Self {
        SessionError::ControllerUnavailable {
            message: message.into(),
        }
    }
}

// Lift into the stack-wide error type for embedders composing several
// rmodem components behind one Result.
impl From<SessionError> for infra_common::Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvariantViolation { .. } => {
                infra_common::Error::Internal(err.to_string())
            }
            other => infra_common::Error::Custom(other.to_string()),
        }
    }
}
