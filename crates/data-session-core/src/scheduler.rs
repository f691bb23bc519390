//! Reconnect scheduling with exponential backoff.
//!
//! One timer may be outstanding at a time; arming a new one replaces any
//! pending timer. The timer fires by posting `RetryTimerFired` onto the
//! controller queue, so the callback runs on the controller task like every
//! other signal.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::events::SessionEvent;

/// The growing delay between consecutive reconnect attempts.
///
/// Starts at the initial delay, doubles after every scheduled attempt, and
/// clamps at the configured ceiling so the delay stays meaningful after a
/// long outage.
#[derive(Debug, Clone)]
pub struct BackoffState {
    next_delay: Duration,
    initial: Duration,
    max: Duration,
}

impl BackoffState {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next_delay: initial,
            initial,
            max,
        }
    }

    /// Current delay without consuming it.
    pub fn next_delay(&self) -> Duration {
        self.next_delay
    }

    /// Consume the current delay: returns it and doubles for next time.
    pub fn advance(&mut self) -> Duration {
        let delay = self.next_delay;
        self.next_delay = (delay * 2).min(self.max);
        delay
    }

    /// Back to the initial delay.
    pub fn reset(&mut self) {
        self.next_delay = self.initial;
    }
}

/// Owns the backoff state and the single outstanding retry timer.
#[derive(Debug)]
pub struct ReconnectScheduler {
    events: mpsc::UnboundedSender<SessionEvent>,
    backoff: BackoffState,
    pending: Option<JoinHandle<()>>,
}

impl ReconnectScheduler {
    pub fn new(
        events: mpsc::UnboundedSender<SessionEvent>,
        initial: Duration,
        max: Duration,
    ) -> Self {
        Self {
            events,
            backoff: BackoffState::new(initial, max),
            pending: None,
        }
    }

    /// Arm the one-shot retry timer with the current backoff delay, which is
    /// doubled for the next arm. Replaces any pending timer. Returns the
    /// delay that was armed.
    pub fn schedule_retry(&mut self) -> Duration {
        self.cancel();
        let delay = self.backoff.advance();
        let events = self.events.clone();
        debug!("scheduling reconnect attempt in {:?}", delay);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(SessionEvent::RetryTimerFired);
        }));
        delay
    }

    /// Cancel a pending timer, if any. Safe to call when none is armed.
    pub fn cancel(&mut self) {
        if let Some(task) = self.pending.take() {
            trace!("cancelling pending reconnect timer");
            task.abort();
        }
    }

    /// Called when the timer has fired and its event was consumed.
    pub fn on_fired(&mut self) {
        self.pending = None;
    }

    /// Reset the backoff delay to the initial value. Does not cancel a
    /// pending timer; that is a separate decision.
    pub fn reset(&mut self) {
        self.backoff.reset();
    }

    pub fn next_delay(&self) -> Duration {
        self.backoff.next_delay()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for ReconnectScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
