//! Controller configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the data-session controller. Embedders hand a value of
/// this in; nothing here is read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSessionConfig {
    /// Number of pre-allocated bearer resources
    pub pool_size: usize,
    /// First reconnect delay after a failed setup
    pub reconnect_delay_initial: Duration,
    /// Ceiling for the doubling reconnect delay
    pub reconnect_delay_max: Duration,
    /// Buffered capacity of the notification channel
    pub notification_capacity: usize,
    /// Traffic poll period while the screen is on
    pub poll_period_screen_on: Duration,
    /// Traffic poll period while the screen is off
    pub poll_period_screen_off: Duration,
    /// Consecutive sent-without-received polls before a stall is suspected
    pub stall_poll_threshold: u32,
}

impl Default for DataSessionConfig {
    fn default() -> Self {
        Self {
            pool_size: 1,
            reconnect_delay_initial: Duration::from_secs(5),
            reconnect_delay_max: Duration::from_secs(600),
            notification_capacity: 64,
            poll_period_screen_on: Duration::from_secs(1),
            poll_period_screen_off: Duration::from_secs(600),
            stall_poll_threshold: 10,
        }
    }
}
