use thiserror::Error;

/// Result type used throughout infra-common
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure-level errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging subsystem could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),

    /// A channel to another component is gone
    #[error("Channel error: {0}")]
    Channel(String),

    /// Internal error that should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),

    /// Catch-all for errors raised by embedders
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Shorthand for an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}
