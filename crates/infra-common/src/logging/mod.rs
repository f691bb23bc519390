//! Logging configuration for the rmodem stack.

pub mod setup;

pub use setup::{parse_log_level, setup_logging, LoggingConfig};
