//! Subscriber record load tracking.
//!
//! Subscriber identity records (MDN, MIN, SID/NID) load asynchronously after
//! radio power-up. This store counts the outstanding loads and posts a single
//! `RecordsLoaded` event onto the controller queue once every requested
//! record has arrived. Radio loss resets the store; the records load again
//! on the next power cycle.

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::events::SessionEvent;

/// Tracks asynchronous subscriber-record loading.
#[derive(Debug)]
pub struct SubscriberRecords {
    events: mpsc::UnboundedSender<SessionEvent>,
    records_to_load: i32,
    records_requested: bool,
    loaded: bool,

    /// Mobile directory number
    pub mdn: Option<String>,
    /// Mobile identification number
    pub min: Option<String>,
    /// Home system/network identifiers
    pub sid_nid: Option<String>,
}

impl SubscriberRecords {
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            events,
            // no requests are made yet
            records_to_load: 0,
            records_requested: false,
            loaded: false,
            mdn: None,
            min: None,
            sid_nid: None,
        }
    }

    /// Whether the full record set has been loaded.
    pub fn records_loaded(&self) -> bool {
        self.loaded
    }

    /// Begin a load cycle. Each expected record must be announced with
    /// `expect_record` before its `record_loaded` arrives.
    pub fn request_records(&mut self) {
        debug!("subscriber record load requested");
        self.loaded = false;
        self.records_requested = true;
    }

    /// Announce one outstanding record fetch.
    pub fn expect_record(&mut self) {
        self.records_to_load += 1;
    }

    /// One record finished loading.
    pub fn record_loaded(&mut self) {
        self.records_to_load -= 1;

        if self.records_to_load == 0 && self.records_requested {
            self.on_all_records_loaded();
        } else if self.records_to_load < 0 {
            error!("records_to_load < 0, programmer error suspected");
            self.records_to_load = 0;
        }
    }

    pub fn set_mdn(&mut self, mdn: impl Into<String>) {
        self.mdn = Some(mdn.into());
        self.record_loaded();
    }

    pub fn set_min(&mut self, min: impl Into<String>) {
        self.min = Some(min.into());
        self.record_loaded();
    }

    pub fn set_sid_nid(&mut self, sid_nid: impl Into<String>) {
        self.sid_nid = Some(sid_nid.into());
        self.record_loaded();
    }

    /// Radio went away; the record set is stale and must reload after the
    /// next power-up.
    pub fn on_radio_unavailable(&mut self) {
        debug!("radio gone, resetting subscriber records");
        self.records_to_load = 0;
        self.records_requested = false;
        self.loaded = false;
    }

    fn on_all_records_loaded(&mut self) {
        info!("subscriber records loaded");
        self.loaded = true;
        self.records_requested = false;
        let _ = self.events.send(SessionEvent::RecordsLoaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (SubscriberRecords, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SubscriberRecords::new(tx), rx)
    }

    #[test]
    fn posts_loaded_event_once_when_all_records_arrive() {
        let (mut records, mut rx) = store();

        records.request_records();
        records.expect_record();
        records.expect_record();

        records.set_mdn("6505551212");
        assert!(!records.records_loaded());
        assert!(rx.try_recv().is_err());

        records.set_min("1234567890");
        assert!(records.records_loaded());
        assert!(matches!(rx.try_recv().unwrap(), SessionEvent::RecordsLoaded));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn radio_loss_resets_the_store() {
        let (mut records, mut rx) = store();

        records.request_records();
        records.expect_record();
        records.set_mdn("6505551212");
        assert!(records.records_loaded());
        rx.try_recv().unwrap();

        records.on_radio_unavailable();
        assert!(!records.records_loaded());

        // A fresh cycle loads and notifies again
        records.request_records();
        records.expect_record();
        records.set_sid_nid("4162/43");
        assert!(records.records_loaded());
        assert!(matches!(rx.try_recv().unwrap(), SessionEvent::RecordsLoaded));
    }

    #[test]
    fn surplus_completion_is_clamped_not_propagated() {
        let (mut records, mut rx) = store();
        records.record_loaded();
        assert!(!records.records_loaded());
        assert!(rx.try_recv().is_err());
    }
}
