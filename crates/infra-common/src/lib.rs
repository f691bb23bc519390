//! Common infrastructure for the rmodem stack.
//!
//! This crate carries the concerns every rmodem crate needs but none should
//! own: logging configuration on top of `tracing`, and a small error
//! taxonomy with a context-annotation layer.

pub mod errors;
pub mod logging;

pub use errors::{Error, ErrorContext, ErrorExt, Result};
pub use logging::{setup_logging, LoggingConfig};
