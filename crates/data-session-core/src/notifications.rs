//! Session-state notifications.
//!
//! Dependents (connectivity status, applications) subscribe through a
//! `tokio::sync::broadcast` channel. The controller publishes exactly one
//! `StateChanged` per state transition, never duplicated and never skipped,
//! plus the richer connected/unavailable/suspend events around it.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::types::{FailCause, NetworkParams, Reason, SessionState};

/// Notifications published to dependents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SessionNotification {
    /// The session state changed. Exactly one per transition.
    StateChanged {
        old_state: SessionState,
        new_state: SessionState,
        reason: Reason,
    },

    /// The bearer is up; network parameters are usable from now on.
    Connected { params: NetworkParams },

    /// Data is unavailable for a non-transient cause. Published once per
    /// permanent failure; a new attempt needs an external trigger.
    DataUnavailable { cause: FailCause },

    /// Data yielded to a concurrent activity (a voice call on a
    /// non-concurrent technology).
    DataSuspended { reason: Reason },

    /// The suspension reason went away; reconnection is being attempted.
    DataResumed,
}

/// Fans session notifications out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct NotificationProcessor {
    sender: broadcast::Sender<SessionNotification>,
}

impl NotificationProcessor {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to session notifications. A slow subscriber that falls
    /// more than the channel capacity behind sees a `Lagged` error, not
    /// missing controller state.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.sender.subscribe()
    }

    /// Publish a notification to all current subscribers.
    pub fn publish(&self, notification: SessionNotification) {
        match &notification {
            SessionNotification::StateChanged {
                old_state,
                new_state,
                reason,
            } => {
                info!("session state {} -> {} ({})", old_state, new_state, reason);
            }
            SessionNotification::Connected { params } => {
                info!(
                    "data connection up on {} ({})",
                    params.interface_name, params.ip_address
                );
            }
            SessionNotification::DataUnavailable { cause } => {
                warn!("data unavailable: {}", cause);
            }
            SessionNotification::DataSuspended { reason } => {
                info!("data suspended ({})", reason);
            }
            SessionNotification::DataResumed => {
                info!("data resumed");
            }
        }

        if self.sender.send(notification).is_err() {
            // Nobody is listening right now; acceptable.
            debug!("no subscribers for session notification");
        }
    }

    pub fn publish_state_changed(
        &self,
        old_state: SessionState,
        new_state: SessionState,
        reason: Reason,
    ) {
        self.publish(SessionNotification::StateChanged {
            old_state,
            new_state,
            reason,
        });
    }

    pub fn publish_connected(&self, params: NetworkParams) {
        self.publish(SessionNotification::Connected { params });
    }

    pub fn publish_data_unavailable(&self, cause: FailCause) {
        self.publish(SessionNotification::DataUnavailable { cause });
    }

    pub fn publish_data_suspended(&self, reason: Reason) {
        self.publish(SessionNotification::DataSuspended { reason });
    }

    pub fn publish_data_resumed(&self) {
        self.publish(SessionNotification::DataResumed);
    }
}
