//! Traffic accounting for the active session.
//!
//! While the session is connected, a poll task samples the packet counters
//! and watches for a hung bearer: sustained sending with nothing received.
//! When the send-without-receive streak crosses the configured threshold the
//! monitor posts `DataStallSuspected`; the controller tears the session down
//! and power-cycles the radio. The poll slows down while the screen is off.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::events::SessionEvent;

/// Source of interface packet counters (tx, rx).
#[async_trait]
pub trait TrafficCounterSource: Send + Sync {
    async fn packet_counts(&self) -> (u64, u64);
}

/// Polls traffic counters while a session is up.
pub struct TrafficMonitor {
    source: Arc<dyn TrafficCounterSource>,
    events: mpsc::UnboundedSender<SessionEvent>,
    period_screen_on: Duration,
    period_screen_off: Duration,
    stall_threshold: u32,
    screen_on: bool,
    task: Option<JoinHandle<()>>,
}

impl TrafficMonitor {
    pub fn new(
        source: Arc<dyn TrafficCounterSource>,
        events: mpsc::UnboundedSender<SessionEvent>,
        period_screen_on: Duration,
        period_screen_off: Duration,
        stall_threshold: u32,
    ) -> Self {
        Self {
            source,
            events,
            period_screen_on,
            period_screen_off,
            stall_threshold,
            screen_on: true,
            task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Start polling with fresh stats. Restarts if already running.
    pub fn start(&mut self) {
        self.stop();
        let period = self.current_period();
        debug!("starting traffic poll every {:?}", period);

        let source = self.source.clone();
        let events = self.events.clone();
        let threshold = self.stall_threshold;

        self.task = Some(tokio::spawn(async move {
            let mut last: Option<(u64, u64)> = None;
            let mut sent_since_last_recv: u32 = 0;

            loop {
                tokio::time::sleep(period).await;
                let (tx, rx) = source.packet_counts().await;

                if let Some((prev_tx, prev_rx)) = last {
                    let sent = tx.saturating_sub(prev_tx);
                    let received = rx.saturating_sub(prev_rx);

                    if received > 0 {
                        sent_since_last_recv = 0;
                    } else if sent > 0 {
                        sent_since_last_recv += 1;
                    }

                    if sent_since_last_recv >= threshold {
                        warn!(
                            "{} polls sent without receiving, suspecting data stall",
                            sent_since_last_recv
                        );
                        let _ = events.send(SessionEvent::DataStallSuspected);
                        break;
                    }
                }
                last = Some((tx, rx));
            }
        }));
    }

    /// Stop polling. Stats restart from scratch on the next `start`.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("stopping traffic poll");
            task.abort();
        }
    }

    /// Screen state switched; re-arm the poll at the matching period if the
    /// monitor is currently running.
    pub fn set_screen_state(&mut self, on: bool) {
        if self.screen_on == on {
            return;
        }
        self.screen_on = on;
        if self.is_running() {
            self.start();
        }
    }

    fn current_period(&self) -> Duration {
        if self.screen_on {
            self.period_screen_on
        } else {
            self.period_screen_off
        }
    }
}

impl Drop for TrafficMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
