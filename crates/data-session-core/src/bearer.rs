//! Bearer resources and the fixed-size pool that owns them.
//!
//! A `BearerResource` stands for one physical data bearer. The pool is
//! pre-allocated at controller start and resources are reused across
//! sessions; the pool lends a resource to the controller between `acquire`
//! and `release`. The pool is only ever touched from the controller task.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::{Result, SessionError};
use crate::types::{FailCause, NetworkParams};

/// Stable identity of a pool slot.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BearerId(pub usize);

impl std::fmt::Display for BearerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bearer-{}", self.0)
    }
}

/// Lifecycle state of one bearer resource.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum BearerState {
    Inactive,
    Activating,
    Active,
    Disconnecting,
}

/// One pooled bearer. Network parameters are populated only while `Active`;
/// `fail_cause` is meaningful only after a failed activation.
#[derive(Debug, Clone)]
pub struct BearerResource {
    pub id: BearerId,
    pub state: BearerState,
    pub params: Option<NetworkParams>,
    pub fail_cause: Option<FailCause>,
}

impl BearerResource {
    fn new(id: BearerId) -> Self {
        Self {
            id,
            state: BearerState::Inactive,
            params: None,
            fail_cause: None,
        }
    }

    fn clear_settings(&mut self) {
        self.params = None;
    }
}

/// Fixed-size pool of bearer resources. Capacity 1 by default; a larger
/// pool allows that many concurrent sessions.
#[derive(Debug)]
pub struct BearerPool {
    bearers: Vec<BearerResource>,
}

impl BearerPool {
    pub fn new(capacity: usize) -> Self {
        let bearers = (0..capacity).map(|i| BearerResource::new(BearerId(i))).collect();
        Self { bearers }
    }

    pub fn capacity(&self) -> usize {
        self.bearers.len()
    }

    /// Number of bearers currently lent out (Activating, Active or
    /// Disconnecting).
    pub fn in_use(&self) -> usize {
        self.bearers
            .iter()
            .filter(|b| b.state != BearerState::Inactive)
            .count()
    }

    /// Hand out the first inactive bearer, marking it `Activating`.
    /// `None` means the pool is exhausted and setup is not possible right now.
    pub fn acquire(&mut self) -> Option<BearerId> {
        let bearer = self.bearers.iter_mut().find(|b| b.state == BearerState::Inactive)?;
        bearer.state = BearerState::Activating;
        bearer.fail_cause = None;
        debug!("{} acquired", bearer.id);
        Some(bearer.id)
    }

    /// Record a completed activation: parameters arrive, bearer goes Active.
    pub fn mark_active(&mut self, id: BearerId, params: NetworkParams) -> Result<()> {
        let bearer = self.get_mut(id)?;
        if bearer.state != BearerState::Activating {
            return Err(SessionError::invariant(format!(
                "{} marked active while {:?}",
                id, bearer.state
            )));
        }
        bearer.state = BearerState::Active;
        bearer.params = Some(params);
        bearer.fail_cause = None;
        Ok(())
    }

    /// Record that a teardown has been issued for this bearer.
    pub fn mark_disconnecting(&mut self, id: BearerId) -> Result<()> {
        let bearer = self.get_mut(id)?;
        if bearer.state == BearerState::Inactive {
            return Err(SessionError::invariant(format!(
                "{} disconnect requested while inactive",
                id
            )));
        }
        bearer.state = BearerState::Disconnecting;
        Ok(())
    }

    /// Record a failed activation and return the bearer to the pool.
    pub fn record_failure(&mut self, id: BearerId, cause: FailCause) -> Result<()> {
        let bearer = self.get_mut(id)?;
        if bearer.state == BearerState::Inactive {
            return Err(SessionError::invariant(format!(
                "{} failure recorded while inactive",
                id
            )));
        }
        bearer.state = BearerState::Inactive;
        bearer.fail_cause = Some(cause);
        bearer.clear_settings();
        debug!("{} released after failure: {}", id, cause);
        Ok(())
    }

    /// Return a bearer to the pool. Releasing an already-inactive bearer is
    /// a programming error and reported loudly instead of tolerated.
    pub fn release(&mut self, id: BearerId) -> Result<()> {
        let bearer = self.get_mut(id)?;
        if bearer.state == BearerState::Inactive {
            error!("{} double release", id);
            return Err(SessionError::invariant(format!("{} released twice", id)));
        }
        bearer.state = BearerState::Inactive;
        bearer.clear_settings();
        debug!("{} released", id);
        Ok(())
    }

    pub fn get(&self, id: BearerId) -> Option<&BearerResource> {
        self.bearers.get(id.0)
    }

    /// Network parameters of the first active bearer, if any.
    pub fn active_params(&self) -> Option<&NetworkParams> {
        self.bearers
            .iter()
            .find(|b| b.state == BearerState::Active)
            .and_then(|b| b.params.as_ref())
    }

    fn get_mut(&mut self, id: BearerId) -> Result<&mut BearerResource> {
        self.bearers
            .get_mut(id.0)
            .ok_or(SessionError::UnknownBearer { id: id.0 })
    }
}
