//! Seam to the radio/modem command layer.
//!
//! The controller never blocks on these calls: it spawns a task around the
//! returned future and the outcome comes back as an `ActivationComplete` /
//! `DeactivationComplete` event on the controller queue, tagged with the
//! attempt it belongs to.

use async_trait::async_trait;

use crate::types::{FailCause, NetworkParams, RadioTechnology};

/// Commands the controller issues to the radio.
#[async_trait]
pub trait RadioCommands: Send + Sync {
    /// Bring up the data bearer on the given technology. Resolves to the
    /// negotiated network parameters, or to the failure classification.
    async fn activate(&self, technology: RadioTechnology)
        -> Result<NetworkParams, FailCause>;

    /// Tear the bearer down. Completion is all the controller needs; a
    /// failed teardown leaves nothing the controller could do differently.
    async fn deactivate(&self);

    /// Power the radio on or off. Used by stall recovery; the service layer
    /// is expected to restore power when its desired state is still on.
    async fn set_radio_power(&self, on: bool);
}
