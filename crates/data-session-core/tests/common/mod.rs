#![allow(dead_code)]

//! Shared fixtures for the controller integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::Notify;

use rmodem_data_session_core::{
    FailCause, NetworkParams, RadioCommands, RadioTechnology, Reason, SessionHandle,
    SessionNotification, SessionState,
};

pub fn params() -> NetworkParams {
    NetworkParams {
        interface_name: "ppp0".to_string(),
        ip_address: "10.32.4.7".to_string(),
        gateway: "10.32.4.1".to_string(),
        dns_servers: vec!["198.51.100.1".to_string(), "198.51.100.2".to_string()],
    }
}

/// Radio double that plays back scripted activation results and counts
/// what the controller asked of it.
pub struct MockRadio {
    results: Mutex<VecDeque<Result<NetworkParams, FailCause>>>,
    pub activations: AtomicUsize,
    pub deactivations: AtomicUsize,
    pub power_offs: AtomicUsize,
    holding: AtomicBool,
    release: Notify,
}

impl MockRadio {
    pub fn scripted(results: Vec<Result<NetworkParams, FailCause>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
            power_offs: AtomicUsize::new(0),
            holding: AtomicBool::new(false),
            release: Notify::new(),
        })
    }

    /// Make the next activation block until `release_held` is called.
    pub fn hold_next_activation(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    pub fn release_held(&self) {
        self.release.notify_one();
    }

    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivation_count(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }

    pub fn power_off_count(&self) -> usize {
        self.power_offs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RadioCommands for MockRadio {
    async fn activate(&self, _technology: RadioTechnology) -> Result<NetworkParams, FailCause> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        if self.holding.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(params()))
    }

    async fn deactivate(&self) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
    }

    async fn set_radio_power(&self, on: bool) {
        if !on {
            self.power_offs.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Traffic counter source for a bearer that only ever sends: tx grows on
/// every sample, rx never moves.
pub struct FrozenRxCounters {
    tx: AtomicUsize,
}

impl FrozenRxCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tx: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl rmodem_data_session_core::TrafficCounterSource for FrozenRxCounters {
    async fn packet_counts(&self) -> (u64, u64) {
        let tx = self.tx.fetch_add(25, Ordering::SeqCst) + 25;
        (tx as u64, 1)
    }
}

/// Radio up, records loaded, packet network attached: the standard ready
/// preconditions for a setup.
pub fn bring_up(handle: &SessionHandle, technology: RadioTechnology) {
    handle.on_radio_available().unwrap();
    handle.on_records_loaded().unwrap();
    handle.on_attached(technology).unwrap();
}

/// Receive the next notification, failing the test on a stuck channel.
pub async fn recv_notification(
    rx: &mut broadcast::Receiver<SessionNotification>,
) -> SessionNotification {
    tokio::time::timeout(Duration::from_secs(3600), rx.recv())
        .await
        .expect("no notification within timeout")
        .expect("notification channel closed")
}

/// Receive notifications until the next state change and return it.
pub async fn next_state_change(
    rx: &mut broadcast::Receiver<SessionNotification>,
) -> (SessionState, SessionState, Reason) {
    loop {
        if let SessionNotification::StateChanged {
            old_state,
            new_state,
            reason,
        } = recv_notification(rx).await
        {
            return (old_state, new_state, reason);
        }
    }
}

/// Wait until the given state change arrives, skipping everything else.
pub async fn await_transition(
    rx: &mut broadcast::Receiver<SessionNotification>,
    from: SessionState,
    to: SessionState,
) -> Reason {
    loop {
        let (old_state, new_state, reason) = next_state_change(rx).await;
        if old_state == from && new_state == to {
            return reason;
        }
    }
}

/// Give spawned tasks (activation/deactivation completions) a chance to run
/// until the condition holds.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not met after yielding");
}

/// Drain everything currently buffered on the notification channel.
pub fn drain(rx: &mut broadcast::Receiver<SessionNotification>) -> Vec<SessionNotification> {
    let mut seen = Vec::new();
    while let Ok(notification) = rx.try_recv() {
        seen.push(notification);
    }
    seen
}
