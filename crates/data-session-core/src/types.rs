use serde::{Deserialize, Serialize};

/// Identity of one activation or deactivation attempt.
///
/// Every request issued to the radio carries a fresh id; a completion whose
/// id no longer matches the controller's outstanding attempt belongs to an
/// abandoned session and is dropped.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct AttemptId(pub uuid::Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of the data session. Exactly one value at any time,
/// owned by the controller.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session and no attempt in progress
    Idle,
    /// No session, but a reconnect timer is armed
    Scanning,
    /// Bearer activation has been issued and its completion is pending
    Initiating,
    /// Bearer is up and carrying traffic
    Connected,
    /// A permanent failure was reported; waiting for an external trigger
    Failed,
}

impl SessionState {
    /// States from which a setup attempt may be started
    pub fn can_start_setup(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Scanning)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "IDLE",
            SessionState::Scanning => "SCANNING",
            SessionState::Initiating => "INITIATING",
            SessionState::Connected => "CONNECTED",
            SessionState::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// Radio access technology reported by the network-attach tracker.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum RadioTechnology {
    OneXRtt,
    EvdoRev0,
    EvdoRevA,
}

impl RadioTechnology {
    /// Whether this technology carries packet data at all
    pub fn supports_packet_data(&self) -> bool {
        matches!(
            self,
            RadioTechnology::OneXRtt | RadioTechnology::EvdoRev0 | RadioTechnology::EvdoRevA
        )
    }

    /// Whether a voice call and a data session can run at the same time.
    /// On 1xRTT the traffic channel is shared, so data must yield to voice.
    pub fn concurrent_voice_and_data(&self) -> bool {
        matches!(self, RadioTechnology::EvdoRev0 | RadioTechnology::EvdoRevA)
    }
}

/// Failure classification reported by a failed bearer activation.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum FailCause {
    /// Unclassified failure; assumed transient
    Unknown,
    /// Signal dropped while the setup was in flight
    SignalLost,
    /// Radio rejected the request because it was busy
    RadioBusy,
    /// Radio reported itself unavailable
    RadioNotAvailable,
    /// Radio is powered off
    RadioOff,
    /// Radio asked for the request to be retried later
    RadioErrorRetry,
    /// No usable signal
    NoSignal,
    /// Subscriber identity module is locked
    SimLocked,
    /// Network rejected the credentials
    AuthenticationFailure,
    /// Subscription does not permit packet data
    SubscriptionBarred,
}

impl FailCause {
    /// Permanent failures are surfaced once and never retried automatically.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            FailCause::SimLocked | FailCause::AuthenticationFailure | FailCause::SubscriptionBarred
        )
    }

    /// Whether an immediate retry (without waiting for the reconnect timer)
    /// has a chance of succeeding. Radio-side outages do not: those go
    /// through the scheduler.
    pub fn is_retryable_now(&self) -> bool {
        matches!(
            self,
            FailCause::Unknown | FailCause::SignalLost | FailCause::RadioBusy
        )
    }
}

impl std::fmt::Display for FailCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Why a setup or teardown was triggered. Flows through every log line and
/// state-change notification so dependents can tell transitions apart.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Reason {
    DataEnabled,
    DataDisabled,
    RoamingOn,
    RoamingOff,
    PolicyChanged,
    DataAttached,
    DataDetached,
    RadioTurnedOff,
    VoiceCallStarted,
    VoiceCallEnded,
    ReconnectRetry,
    TransientRetry,
    StallRecovery,
    Unspecified,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Reason::DataEnabled => "dataEnabled",
            Reason::DataDisabled => "dataDisabled",
            Reason::RoamingOn => "roamingOn",
            Reason::RoamingOff => "roamingOff",
            Reason::PolicyChanged => "policyChanged",
            Reason::DataAttached => "dataAttached",
            Reason::DataDetached => "dataDetached",
            Reason::RadioTurnedOff => "radioTurnedOff",
            Reason::VoiceCallStarted => "voiceCallStarted",
            Reason::VoiceCallEnded => "voiceCallEnded",
            Reason::ReconnectRetry => "reconnectRetry",
            Reason::TransientRetry => "transientRetry",
            Reason::StallRecovery => "stallRecovery",
            Reason::Unspecified => "unspecified",
        };
        write!(f, "{}", s)
    }
}

/// Network parameters handed back by a successful bearer activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub interface_name: String,
    pub ip_address: String,
    pub gateway: String,
    pub dns_servers: Vec<String>,
}

/// Externally supplied policy switches. The controller only reads these;
/// the policy store owns them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PolicyFlags {
    /// Mobile data has not been explicitly disabled by the user/admin
    pub user_enabled: bool,
    /// Sessions may be established while roaming
    pub data_roaming_allowed: bool,
}

impl Default for PolicyFlags {
    fn default() -> Self {
        PolicyFlags {
            user_enabled: true,
            data_roaming_allowed: false,
        }
    }
}

/// Point-in-time view of the session published on a watch channel, so
/// embedders can read connection details without a queue round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub params: Option<NetworkParams>,
}

impl SessionSnapshot {
    pub fn new(state: SessionState, params: Option<NetworkParams>) -> Self {
        Self { state, params }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::new(SessionState::Idle, None)
    }
}
