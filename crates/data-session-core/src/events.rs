//! Inbound events driving the session controller.
//!
//! Every collaborator signal (radio power, subscriber records, network
//! attach, roaming, voice calls, policy, timers, async radio completions)
//! arrives as one `SessionEvent` on the controller's queue. Handlers run to
//! completion one event at a time, so the controller state needs no locks.

use tokio::sync::oneshot;

use crate::types::{AttemptId, FailCause, NetworkParams, RadioTechnology, Reason};

/// A single message on the controller queue.
#[derive(Debug)]
pub enum SessionEvent {
    /// Radio stack came up
    RadioAvailable,
    /// Radio stack went away; no graceful teardown is possible
    RadioUnavailable,
    /// Subscriber records finished loading
    RecordsLoaded,
    /// Attached to the packet network on the given technology
    Attached { technology: RadioTechnology },
    /// Detached from the packet network
    Detached,
    /// Roaming started
    RoamingOn,
    /// Roaming ended
    RoamingOff,
    /// Policy store changed the data-roaming switch
    RoamingPolicyChanged { allowed: bool },
    /// A voice call went active
    VoiceCallStarted,
    /// The voice call ended
    VoiceCallEnded,
    /// User/policy request to enable or disable mobile data
    EnableRequested {
        enabled: bool,
        reply: Option<oneshot::Sender<bool>>,
    },
    /// Speculative setup request; a no-op unless all guards hold
    TrySetup {
        reason: Reason,
        reply: Option<oneshot::Sender<bool>>,
    },
    /// Async completion of a bearer activation
    ActivationComplete {
        attempt: AttemptId,
        result: std::result::Result<NetworkParams, FailCause>,
    },
    /// Async completion of a bearer teardown
    DeactivationComplete { attempt: AttemptId },
    /// The reconnect timer fired
    RetryTimerFired,
    /// Screen turned on or off; adjusts the traffic poll period
    ScreenStateChanged { on: bool },
    /// Traffic monitor saw sustained send-without-receive
    DataStallSuspected,
    /// Stop the controller task
    Shutdown,
}

impl SessionEvent {
    /// Variant name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::RadioAvailable => "RadioAvailable",
            SessionEvent::RadioUnavailable => "RadioUnavailable",
            SessionEvent::RecordsLoaded => "RecordsLoaded",
            SessionEvent::Attached { .. } => "Attached",
            SessionEvent::Detached => "Detached",
            SessionEvent::RoamingOn => "RoamingOn",
            SessionEvent::RoamingOff => "RoamingOff",
            SessionEvent::RoamingPolicyChanged { .. } => "RoamingPolicyChanged",
            SessionEvent::VoiceCallStarted => "VoiceCallStarted",
            SessionEvent::VoiceCallEnded => "VoiceCallEnded",
            SessionEvent::EnableRequested { .. } => "EnableRequested",
            SessionEvent::TrySetup { .. } => "TrySetup",
            SessionEvent::ActivationComplete { .. } => "ActivationComplete",
            SessionEvent::DeactivationComplete { .. } => "DeactivationComplete",
            SessionEvent::RetryTimerFired => "RetryTimerFired",
            SessionEvent::ScreenStateChanged { .. } => "ScreenStateChanged",
            SessionEvent::DataStallSuspected => "DataStallSuspected",
            SessionEvent::Shutdown => "Shutdown",
        }
    }
}
