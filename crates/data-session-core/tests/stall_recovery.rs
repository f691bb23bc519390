//! Stall watchdog: a bearer that sends without ever receiving gets torn
//! down and the radio is power-cycled.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{await_transition, bring_up, params, wait_for, FrozenRxCounters, MockRadio};
use rmodem_data_session_core::{
    DataSessionConfig, DataSessionController, Reason, SessionState, TrafficCounterSource,
    RadioTechnology,
};

#[tokio::test(start_paused = true)]
async fn sustained_send_without_receive_recycles_the_session() {
    let config = DataSessionConfig {
        poll_period_screen_on: Duration::from_secs(1),
        stall_poll_threshold: 3,
        ..Default::default()
    };
    let radio = MockRadio::scripted(vec![Ok(params())]);
    let counters: Arc<dyn TrafficCounterSource> = FrozenRxCounters::new();
    let (handle, _task) =
        DataSessionController::spawn(config, radio.clone(), Some(counters));
    let mut rx = handle.subscribe();

    bring_up(&handle, RadioTechnology::EvdoRevA);
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;

    // The poll task watches the frozen counters and eventually gives up
    let reason = await_transition(&mut rx, SessionState::Connected, SessionState::Idle).await;
    assert_eq!(reason, Reason::StallRecovery);

    wait_for(|| radio.deactivation_count() == 1).await;
    wait_for(|| radio.power_off_count() == 1).await;
}
