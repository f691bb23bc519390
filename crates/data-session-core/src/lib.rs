//! Packet-data session lifecycle control.
//!
//! This crate decides when a device's packet-data bearer is brought up, kept
//! up, or torn down, in the presence of asynchronous and sometimes
//! contradictory signals: radio power transitions, subscriber-record
//! loading, roaming transitions, concurrent voice calls, and explicit
//! enable/disable requests. Failed setups are retried with capped
//! exponential backoff, the underlying bearer resource is never leaked or
//! double-activated, and dependents are told about every state transition
//! exactly once.
//!
//! The heart of the crate is [`DataSessionController`], a single task that
//! consumes every collaborator signal from one ordered queue. Collaborators
//! talk to it through a [`SessionHandle`]; dependents subscribe to
//! [`SessionNotification`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rmodem_data_session_core::{
//!     DataSessionConfig, DataSessionController, RadioCommands, RadioTechnology,
//! };
//!
//! # async fn example(radio: Arc<dyn RadioCommands>) {
//! let (handle, _task) =
//!     DataSessionController::spawn(DataSessionConfig::default(), radio, None);
//!
//! let mut notifications = handle.subscribe();
//! handle.on_radio_available().unwrap();
//! handle.on_records_loaded().unwrap();
//! handle.on_attached(RadioTechnology::EvdoRevA).unwrap();
//!
//! while let Ok(notification) = notifications.recv().await {
//!     println!("{:?}", notification);
//! }
//! # }
//! ```

pub mod bearer;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod handle;
pub mod notifications;
pub mod radio;
pub mod records;
pub mod scheduler;
pub mod traffic;
pub mod types;

pub use bearer::{BearerId, BearerPool, BearerResource, BearerState};
pub use config::DataSessionConfig;
pub use controller::DataSessionController;
pub use errors::{Result, SessionError};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use notifications::{NotificationProcessor, SessionNotification};
pub use radio::RadioCommands;
pub use records::SubscriberRecords;
pub use scheduler::{BackoffState, ReconnectScheduler};
pub use traffic::{TrafficCounterSource, TrafficMonitor};
pub use types::{
    AttemptId, FailCause, NetworkParams, PolicyFlags, RadioTechnology, Reason, SessionSnapshot,
    SessionState,
};
