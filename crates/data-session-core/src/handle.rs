//! Public API object for the session controller.
//!
//! Collaborators push their signals through this handle; each method posts
//! one event onto the controller queue. The handle is cheap to clone and
//! safe to use from any task.

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::errors::{Result, SessionError};
use crate::events::SessionEvent;
use crate::notifications::{NotificationProcessor, SessionNotification};
use crate::types::{NetworkParams, RadioTechnology, Reason, SessionSnapshot};

/// Handle to a running `DataSessionController`.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    notifications: NotificationProcessor,
    status: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub(crate) fn new(
        events: mpsc::UnboundedSender<SessionEvent>,
        notifications: NotificationProcessor,
        status: watch::Receiver<SessionSnapshot>,
    ) -> Self {
        Self {
            events,
            notifications,
            status,
        }
    }

    // ----- collaborator signals -----

    pub fn on_radio_available(&self) -> Result<()> {
        self.send(SessionEvent::RadioAvailable)
    }

    pub fn on_radio_unavailable(&self) -> Result<()> {
        self.send(SessionEvent::RadioUnavailable)
    }

    pub fn on_records_loaded(&self) -> Result<()> {
        self.send(SessionEvent::RecordsLoaded)
    }

    pub fn on_attached(&self, technology: RadioTechnology) -> Result<()> {
        self.send(SessionEvent::Attached { technology })
    }

    pub fn on_detached(&self) -> Result<()> {
        self.send(SessionEvent::Detached)
    }

    pub fn on_roaming_entered(&self) -> Result<()> {
        self.send(SessionEvent::RoamingOn)
    }

    pub fn on_roaming_left(&self) -> Result<()> {
        self.send(SessionEvent::RoamingOff)
    }

    pub fn set_roaming_policy(&self, allowed: bool) -> Result<()> {
        self.send(SessionEvent::RoamingPolicyChanged { allowed })
    }

    pub fn on_voice_call_started(&self) -> Result<()> {
        self.send(SessionEvent::VoiceCallStarted)
    }

    pub fn on_voice_call_ended(&self) -> Result<()> {
        self.send(SessionEvent::VoiceCallEnded)
    }

    pub fn on_screen_state_changed(&self, on: bool) -> Result<()> {
        self.send(SessionEvent::ScreenStateChanged { on })
    }

    // ----- requests with an answer -----

    /// Enable or disable mobile data. Resolves once the controller has
    /// acted on the request.
    pub async fn request_enable(&self, enabled: bool) -> Result<bool> {
        let (reply, answer) = oneshot::channel();
        self.send(SessionEvent::EnableRequested {
            enabled,
            reply: Some(reply),
        })?;
        answer
            .await
            .map_err(|_| SessionError::controller_unavailable("controller dropped the request"))
    }

    /// Ask for a setup attempt. Safe to call speculatively; resolves to
    /// whether a setup was actually started.
    pub async fn try_setup(&self, reason: Reason) -> Result<bool> {
        let (reply, answer) = oneshot::channel();
        self.send(SessionEvent::TrySetup {
            reason,
            reply: Some(reply),
        })?;
        answer
            .await
            .map_err(|_| SessionError::controller_unavailable("controller dropped the request"))
    }

    // ----- observation -----

    /// Subscribe to session-state notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotification> {
        self.notifications.subscribe()
    }

    /// Current session snapshot (state plus network parameters, if up).
    pub fn status(&self) -> SessionSnapshot {
        self.status.borrow().clone()
    }

    /// Network parameters of the active session, if connected.
    pub fn network_params(&self) -> Option<NetworkParams> {
        self.status.borrow().params.clone()
    }

    /// A watch receiver for embedders that want push-style status updates.
    pub fn status_watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.status.clone()
    }

    /// Stop the controller task. Any active bearer is torn down on the way
    /// out.
    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown)
    }

    fn send(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .map_err(|e| SessionError::controller_unavailable(format!("event not delivered: {}", e)))
    }
}
