//! The data-session controller.
//!
//! A single task owns all session state and consumes every collaborator
//! signal from one queue, strictly in arrival order. Handlers run to
//! completion and never block: radio activation and teardown are spawned
//! off, and their completions come back as events tagged with the attempt
//! they belong to, so a completion for an abandoned attempt is dropped
//! instead of corrupting a newer session.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bearer::{BearerId, BearerPool, BearerState};
use crate::config::DataSessionConfig;
use crate::events::SessionEvent;
use crate::handle::SessionHandle;
use crate::notifications::NotificationProcessor;
use crate::radio::RadioCommands;
use crate::scheduler::ReconnectScheduler;
use crate::traffic::{TrafficCounterSource, TrafficMonitor};
use crate::types::{
    AttemptId, FailCause, NetworkParams, PolicyFlags, RadioTechnology, Reason, SessionSnapshot,
    SessionState,
};

/// Owns the session state machine. Constructed and spawned by the embedder;
/// there is exactly one per modem, and nothing about it is global.
pub struct DataSessionController {
    config: DataSessionConfig,
    radio: Arc<dyn RadioCommands>,

    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    notifications: NotificationProcessor,
    status: watch::Sender<SessionSnapshot>,

    pool: BearerPool,
    scheduler: ReconnectScheduler,
    traffic: Option<TrafficMonitor>,

    state: SessionState,
    active_bearer: Option<BearerId>,
    /// Outstanding activation or deactivation, if any
    attempt: Option<AttemptId>,
    /// Why the in-flight or last setup was started
    setup_reason: Reason,
    consecutive_failures: u32,

    // Snapshots of collaborator state, updated only by events
    radio_available: bool,
    records_loaded: bool,
    attached_technology: Option<RadioTechnology>,
    roaming: bool,
    voice_call_active: bool,
    suspended_by_voice: bool,
    policy: PolicyFlags,
}

impl DataSessionController {
    /// Build a controller and spawn its task. Returns the handle used to
    /// feed it events and the join handle of the controller task.
    pub fn spawn(
        config: DataSessionConfig,
        radio: Arc<dyn RadioCommands>,
        traffic_source: Option<Arc<dyn TrafficCounterSource>>,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let notifications = NotificationProcessor::new(config.notification_capacity);
        let (status_tx, status_rx) = watch::channel(SessionSnapshot::default());

        let scheduler = ReconnectScheduler::new(
            events_tx.clone(),
            config.reconnect_delay_initial,
            config.reconnect_delay_max,
        );
        let traffic = traffic_source.map(|source| {
            TrafficMonitor::new(
                source,
                events_tx.clone(),
                config.poll_period_screen_on,
                config.poll_period_screen_off,
                config.stall_poll_threshold,
            )
        });

        let controller = Self {
            pool: BearerPool::new(config.pool_size),
            scheduler,
            traffic,
            radio,
            events_rx,
            events_tx: events_tx.clone(),
            notifications: notifications.clone(),
            status: status_tx,
            state: SessionState::Idle,
            active_bearer: None,
            attempt: None,
            setup_reason: Reason::Unspecified,
            consecutive_failures: 0,
            radio_available: false,
            records_loaded: false,
            attached_technology: None,
            roaming: false,
            voice_call_active: false,
            suspended_by_voice: false,
            policy: PolicyFlags::default(),
            config,
        };

        let handle = SessionHandle::new(events_tx, notifications, status_rx);
        let task = tokio::spawn(controller.run());
        (handle, task)
    }

    async fn run(mut self) {
        info!(
            "data-session controller started (pool size {})",
            self.config.pool_size
        );
        while let Some(event) = self.events_rx.recv().await {
            debug!("handling {}", event.kind());
            if !self.handle_event(event) {
                break;
            }
        }
        info!("data-session controller stopped");
    }

    /// Dispatch one event. Returns false when the controller should stop.
    fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::RadioAvailable => self.on_radio_available(),
            SessionEvent::RadioUnavailable => self.on_radio_unavailable(),
            SessionEvent::RecordsLoaded => self.on_records_loaded(),
            SessionEvent::Attached { technology } => self.on_attached(technology),
            SessionEvent::Detached => self.on_detached(),
            SessionEvent::RoamingOn => self.on_roaming_on(),
            SessionEvent::RoamingOff => self.on_roaming_off(),
            SessionEvent::RoamingPolicyChanged { allowed } => self.on_roaming_policy(allowed),
            SessionEvent::VoiceCallStarted => self.on_voice_call_started(),
            SessionEvent::VoiceCallEnded => self.on_voice_call_ended(),
            SessionEvent::EnableRequested { enabled, reply } => {
                let accepted = self.on_enable_requested(enabled);
                if let Some(reply) = reply {
                    let _ = reply.send(accepted);
                }
            }
            SessionEvent::TrySetup { reason, reply } => {
                let accepted = self.try_setup(reason);
                if let Some(reply) = reply {
                    let _ = reply.send(accepted);
                }
            }
            SessionEvent::ActivationComplete { attempt, result } => {
                self.on_activation_complete(attempt, result)
            }
            SessionEvent::DeactivationComplete { attempt } => {
                self.on_deactivation_complete(attempt)
            }
            SessionEvent::RetryTimerFired => self.on_retry_timer_fired(),
            SessionEvent::ScreenStateChanged { on } => {
                if let Some(traffic) = self.traffic.as_mut() {
                    traffic.set_screen_state(on);
                }
            }
            SessionEvent::DataStallSuspected => self.on_data_stall(),
            SessionEvent::Shutdown => {
                self.on_shutdown();
                return false;
            }
        }
        true
    }

    // ----- collaborator signals -----

    fn on_radio_available(&mut self) {
        self.radio_available = true;
        // A session surviving a radio restart cannot be trusted
        if self.state != SessionState::Idle {
            self.clean_up_connection(true, Reason::Unspecified);
        }
    }

    fn on_radio_unavailable(&mut self) {
        self.radio_available = false;
        self.records_loaded = false;
        self.attached_technology = None;
        self.suspended_by_voice = false;
        self.consecutive_failures = 0;

        // Start from the initial delay next time the radio comes up
        self.scheduler.reset();
        self.scheduler.cancel();

        // The bearer cannot be reasoned about once the radio is gone:
        // unconditional local cleanup, no deactivation handshake.
        self.clean_up_connection(false, Reason::RadioTurnedOff);
    }

    fn on_records_loaded(&mut self) {
        self.records_loaded = true;
        if self.state == SessionState::Failed {
            self.clean_up_connection(false, Reason::Unspecified);
        }
        self.post_try_setup(Reason::Unspecified);
    }

    fn on_attached(&mut self, technology: RadioTechnology) {
        self.attached_technology = Some(technology);
        if self.state == SessionState::Connected {
            if let Some(traffic) = self.traffic.as_mut() {
                traffic.start();
            }
        } else {
            self.post_try_setup(Reason::DataAttached);
        }
    }

    fn on_detached(&mut self) {
        self.attached_technology = None;
        match self.state {
            SessionState::Connected | SessionState::Initiating => {
                self.clean_up_connection(true, Reason::DataDetached);
            }
            _ => {}
        }
    }

    fn on_roaming_on(&mut self) {
        self.roaming = true;
        if self.policy.data_roaming_allowed {
            self.post_try_setup(Reason::RoamingOn);
        } else {
            debug!("tearing down data connection on roaming");
            self.clean_up_connection(true, Reason::RoamingOn);
        }
    }

    fn on_roaming_off(&mut self) {
        self.roaming = false;
        self.post_try_setup(Reason::RoamingOff);
    }

    fn on_roaming_policy(&mut self, allowed: bool) {
        self.policy.data_roaming_allowed = allowed;
        if self.roaming {
            if allowed {
                self.post_try_setup(Reason::PolicyChanged);
            } else {
                self.clean_up_connection(true, Reason::PolicyChanged);
            }
        }
    }

    fn on_voice_call_started(&mut self) {
        self.voice_call_active = true;
        let concurrent = self
            .attached_technology
            .map(|t| t.concurrent_voice_and_data())
            .unwrap_or(false);
        if self.state == SessionState::Connected && !concurrent {
            // Data yields to voice on this technology; resume after the call
            self.suspended_by_voice = true;
            self.notifications.publish_data_suspended(Reason::VoiceCallStarted);
            self.clean_up_connection(true, Reason::VoiceCallStarted);
        }
    }

    fn on_voice_call_ended(&mut self) {
        self.voice_call_active = false;
        if self.suspended_by_voice {
            self.suspended_by_voice = false;
            self.notifications.publish_data_resumed();
        }
        if self.state == SessionState::Connected {
            // Clean slate for the traffic stats after the call
            if let Some(traffic) = self.traffic.as_mut() {
                traffic.start();
            }
        }
        // Also covers a setup attempted while the call was up
        self.post_try_setup(Reason::VoiceCallEnded);
    }

    fn on_enable_requested(&mut self, enabled: bool) -> bool {
        let was_enabled = self.policy.user_enabled;
        debug!("enable request {} (was {})", enabled, was_enabled);

        if enabled && !was_enabled {
            self.policy.user_enabled = true;
            self.try_setup(Reason::DataEnabled)
        } else if !enabled {
            self.policy.user_enabled = false;
            self.consecutive_failures = 0;
            self.scheduler.cancel();
            self.clean_up_connection(true, Reason::DataDisabled);
            true
        } else {
            // already enabled
            true
        }
    }

    // ----- async completions -----

    fn on_activation_complete(
        &mut self,
        attempt: AttemptId,
        result: Result<NetworkParams, FailCause>,
    ) {
        if self.attempt != Some(attempt) {
            warn!("dropping stale activation completion for {}", attempt);
            return;
        }
        self.attempt = None;

        let Some(bearer) = self.active_bearer else {
            warn!("activation completion with no active bearer");
            return;
        };

        match result {
            Ok(params) => self.on_setup_success(bearer, params),
            Err(cause) => self.on_setup_failure(bearer, cause),
        }
    }

    fn on_setup_success(&mut self, bearer: BearerId, params: NetworkParams) {
        if let Err(e) = self.pool.mark_active(bearer, params.clone()) {
            warn!("activation bookkeeping failed: {}", e);
        }
        self.consecutive_failures = 0;
        self.scheduler.reset();
        self.scheduler.cancel();

        self.set_state(SessionState::Connected, self.setup_reason);
        self.notifications.publish_connected(params);
        if let Some(traffic) = self.traffic.as_mut() {
            traffic.start();
        }
    }

    fn on_setup_failure(&mut self, bearer: BearerId, cause: FailCause) {
        debug!("data connection setup failed: {}", cause);
        if let Err(e) = self.pool.record_failure(bearer, cause) {
            warn!("failure bookkeeping failed: {}", e);
        }
        self.active_bearer = None;

        if cause.is_permanent() {
            // Reported once; a new attempt needs an external trigger
            self.consecutive_failures = 0;
            self.set_state(SessionState::Failed, self.setup_reason);
            self.notifications.publish_data_unavailable(cause);
            return;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures == 1 && cause.is_retryable_now() {
            // First failure of the streak: retry right away, no backoff
            self.set_state(SessionState::Idle, Reason::TransientRetry);
            self.post_try_setup(Reason::TransientRetry);
        } else {
            self.set_state(SessionState::Scanning, Reason::TransientRetry);
            let delay = self.scheduler.schedule_retry();
            debug!(
                "scheduling next setup attempt in {}s (failure {})",
                delay.as_secs(),
                self.consecutive_failures
            );
        }
    }

    fn on_deactivation_complete(&mut self, attempt: AttemptId) {
        if self.attempt != Some(attempt) {
            warn!("dropping stale deactivation completion for {}", attempt);
            return;
        }
        self.attempt = None;

        if let Some(bearer) = self.active_bearer.take() {
            if let Err(e) = self.pool.release(bearer) {
                warn!("release after disconnect failed: {}", e);
            }
        }
        // The bearer is free again; reconnect if the guards allow it
        self.post_try_setup(Reason::Unspecified);
    }

    fn on_retry_timer_fired(&mut self) {
        self.scheduler.on_fired();
        debug!("reconnect timer fired in state {}", self.state);
        if self.state == SessionState::Failed {
            self.clean_up_connection(false, Reason::ReconnectRetry);
        }
        self.post_try_setup(Reason::ReconnectRetry);
    }

    fn on_data_stall(&mut self) {
        if self.state != SessionState::Connected {
            return;
        }
        warn!("data stall suspected, recycling the radio");
        self.clean_up_connection(true, Reason::StallRecovery);
        // Power-cycle; the service layer restores power when its desired
        // state is still on.
        let radio = self.radio.clone();
        tokio::spawn(async move {
            radio.set_radio_power(false).await;
        });
    }

    fn on_shutdown(&mut self) {
        debug!("controller shutdown requested");
        self.scheduler.cancel();
        if let Some(traffic) = self.traffic.as_mut() {
            traffic.stop();
        }
        if let Some(bearer) = self.active_bearer.take() {
            let _ = self.pool.release(bearer);
            let radio = self.radio.clone();
            tokio::spawn(async move {
                radio.deactivate().await;
            });
        }
        self.attempt = None;
    }

    // ----- setup and teardown -----

    /// Attempt a setup. Unmet guards are not an error: callers invoke this
    /// speculatively after every relevant event, and it no-ops until the
    /// moment everything lines up.
    fn try_setup(&mut self, reason: Reason) -> bool {
        debug!("trySetup due to {}", reason);

        if !self.state.can_start_setup() {
            debug!("trySetup ignored in state {}", self.state);
            return false;
        }
        if self.active_bearer.is_some() {
            // A teardown is still in flight; its completion re-posts setup
            debug!("trySetup deferred, previous bearer still winding down");
            return false;
        }

        let technology = self.attached_technology;
        let data_capable = technology.map(|t| t.supports_packet_data()).unwrap_or(false);
        let concurrent_ok = !self.voice_call_active
            || technology.map(|t| t.concurrent_voice_and_data()).unwrap_or(false);
        let policy_ok =
            self.policy.user_enabled && (!self.roaming || self.policy.data_roaming_allowed);
        let ready =
            self.radio_available && self.records_loaded && data_capable && concurrent_ok && policy_ok;

        match technology {
            Some(technology) if ready => self.setup_data(technology, reason),
            _ => {
                debug!(
                    "trySetup: not ready for data: state={} radio={} records={} technology={:?} \
                     voiceCall={} enabled={} roaming={} roamingAllowed={}",
                    self.state,
                    self.radio_available,
                    self.records_loaded,
                    technology,
                    self.voice_call_active,
                    self.policy.user_enabled,
                    self.roaming,
                    self.policy.data_roaming_allowed
                );
                false
            }
        }
    }

    fn setup_data(&mut self, technology: RadioTechnology, reason: Reason) -> bool {
        let Some(bearer) = self.pool.acquire() else {
            debug!("setup_data: no free bearer");
            return false;
        };

        let attempt = AttemptId::new();
        self.active_bearer = Some(bearer);
        self.attempt = Some(attempt);
        self.setup_reason = reason;

        let radio = self.radio.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = radio.activate(technology).await;
            let _ = events.send(SessionEvent::ActivationComplete { attempt, result });
        });

        self.set_state(SessionState::Initiating, reason);
        true
    }

    /// Tear the session down locally. With `tear_down` the bearer gets a
    /// graceful async deactivation; without it (radio gone) the resource is
    /// reclaimed immediately.
    fn clean_up_connection(&mut self, tear_down: bool, reason: Reason) {
        debug!("clean up connection due to {}", reason);

        // Abandon any in-flight activation so its completion is dropped
        self.attempt = None;
        if let Some(traffic) = self.traffic.as_mut() {
            traffic.stop();
        }

        if let Some(bearer) = self.active_bearer {
            let in_teardown_state = self
                .pool
                .get(bearer)
                .map(|b| {
                    b.state == BearerState::Active || b.state == BearerState::Activating
                })
                .unwrap_or(false);

            if tear_down && in_teardown_state {
                if let Err(e) = self.pool.mark_disconnecting(bearer) {
                    warn!("disconnect bookkeeping failed: {}", e);
                }
                let attempt = AttemptId::new();
                self.attempt = Some(attempt);
                let radio = self.radio.clone();
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    radio.deactivate().await;
                    let _ = events.send(SessionEvent::DeactivationComplete { attempt });
                });
            } else {
                self.active_bearer = None;
                if let Err(e) = self.pool.release(bearer) {
                    warn!("release during cleanup failed: {}", e);
                }
            }
        }

        self.set_state(SessionState::Idle, reason);
    }

    /// Post a setup attempt back onto the own queue instead of recursing,
    /// so it runs after the current handler and observes settled state.
    fn post_try_setup(&mut self, reason: Reason) {
        let _ = self.events_tx.send(SessionEvent::TrySetup {
            reason,
            reply: None,
        });
    }

    /// The single place session state changes. Publishes exactly one
    /// notification per transition and refreshes the status snapshot.
    fn set_state(&mut self, new_state: SessionState, reason: Reason) {
        if self.state == new_state {
            return;
        }
        let old_state = self.state;
        self.state = new_state;

        self.notifications
            .publish_state_changed(old_state, new_state, reason);
        let params = self.pool.active_params().cloned();
        let _ = self.status.send(SessionSnapshot::new(new_state, params));
    }
}
