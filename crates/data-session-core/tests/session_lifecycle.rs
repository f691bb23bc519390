//! End-to-end lifecycle scenarios: bring-up, idempotent setup requests,
//! stale completions, and the enable/disable switch.

mod common;

use pretty_assertions::assert_eq;

use common::{
    await_transition, bring_up, drain, next_state_change, params, recv_notification, wait_for,
    MockRadio,
};
use rmodem_data_session_core::{
    DataSessionConfig, DataSessionController, Reason, SessionNotification, SessionState,
    RadioTechnology,
};

#[tokio::test(start_paused = true)]
async fn bring_up_reaches_connected_with_network_params() {
    let radio = MockRadio::scripted(vec![Ok(params())]);
    let (handle, _task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio.clone(), None);
    let mut rx = handle.subscribe();

    bring_up(&handle, RadioTechnology::EvdoRevA);

    let (old, new, _reason) = next_state_change(&mut rx).await;
    assert_eq!((old, new), (SessionState::Idle, SessionState::Initiating));

    let (old, new, _) = next_state_change(&mut rx).await;
    assert_eq!((old, new), (SessionState::Initiating, SessionState::Connected));

    let connected = recv_notification(&mut rx).await;
    assert_eq!(connected, SessionNotification::Connected { params: params() });

    assert_eq!(handle.status().state, SessionState::Connected);
    assert_eq!(handle.network_params(), Some(params()));
    assert_eq!(radio.activation_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn try_setup_with_unmet_guards_is_a_logged_noop() {
    let radio = MockRadio::scripted(vec![]);
    let (handle, _task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio.clone(), None);
    let mut rx = handle.subscribe();

    // Nothing is ready: no radio, no records, no attach
    assert!(!handle.try_setup(Reason::Unspecified).await.unwrap());
    assert!(!handle.try_setup(Reason::Unspecified).await.unwrap());

    assert_eq!(handle.status().state, SessionState::Idle);
    assert_eq!(radio.activation_count(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn try_setup_while_initiating_does_not_double_acquire() {
    let radio = MockRadio::scripted(vec![Ok(params())]);
    radio.hold_next_activation();
    let (handle, _task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio.clone(), None);
    let mut rx = handle.subscribe();

    bring_up(&handle, RadioTechnology::EvdoRevA);
    await_transition(&mut rx, SessionState::Idle, SessionState::Initiating).await;

    // Speculative second request while the first is still in flight
    assert!(!handle.try_setup(Reason::Unspecified).await.unwrap());
    assert_eq!(radio.activation_count(), 1);

    radio.release_held();
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;
    assert_eq!(radio.activation_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_activation_completion_is_dropped_after_radio_loss() {
    let radio = MockRadio::scripted(vec![Ok(params()), Ok(params())]);
    radio.hold_next_activation();
    let (handle, _task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio.clone(), None);
    let mut rx = handle.subscribe();

    bring_up(&handle, RadioTechnology::EvdoRevA);
    await_transition(&mut rx, SessionState::Idle, SessionState::Initiating).await;

    // Radio dies while the activation is in flight: unconditional cleanup
    handle.on_radio_unavailable().unwrap();
    let reason = await_transition(&mut rx, SessionState::Initiating, SessionState::Idle).await;
    assert_eq!(reason, Reason::RadioTurnedOff);

    // The abandoned activation now completes successfully and must be
    // ignored rather than resurrect the dead session
    radio.release_held();
    wait_for(|| radio.activation_count() == 1).await;
    assert_eq!(handle.status().state, SessionState::Idle);
    assert!(drain(&mut rx).is_empty());

    // A fresh bring-up still works: the bearer was reclaimed, not leaked
    bring_up(&handle, RadioTechnology::EvdoRevA);
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;
}

#[tokio::test(start_paused = true)]
async fn disable_tears_down_and_enable_reconnects() {
    let radio = MockRadio::scripted(vec![Ok(params()), Ok(params())]);
    let (handle, _task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio.clone(), None);
    let mut rx = handle.subscribe();

    bring_up(&handle, RadioTechnology::EvdoRevA);
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;

    assert!(handle.request_enable(false).await.unwrap());
    let reason = await_transition(&mut rx, SessionState::Connected, SessionState::Idle).await;
    assert_eq!(reason, Reason::DataDisabled);
    wait_for(|| radio.deactivation_count() == 1).await;

    // Disabled: qualifying events no longer bring data up
    handle.on_attached(RadioTechnology::EvdoRevA).unwrap();
    assert!(!handle.try_setup(Reason::Unspecified).await.unwrap());
    assert_eq!(radio.activation_count(), 1);

    assert!(handle.request_enable(true).await.unwrap());
    let reason = await_transition(&mut rx, SessionState::Idle, SessionState::Initiating).await;
    assert_eq!(reason, Reason::DataEnabled);
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;
}

#[tokio::test(start_paused = true)]
async fn every_transition_notifies_exactly_once() {
    let radio = MockRadio::scripted(vec![Ok(params()), Ok(params())]);
    let (handle, _task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio.clone(), None);
    let mut rx = handle.subscribe();

    bring_up(&handle, RadioTechnology::EvdoRevA);
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;

    handle.on_detached().unwrap();
    await_transition(&mut rx, SessionState::Connected, SessionState::Idle).await;
    handle.on_attached(RadioTechnology::EvdoRevA).unwrap();
    await_transition(&mut rx, SessionState::Initiating, SessionState::Connected).await;

    // Let queued speculative setups settle, then verify nothing else came:
    // four transitions happened, four state changes were seen, zero extras
    assert!(!handle.try_setup(Reason::Unspecified).await.unwrap());
    let leftovers: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|n| matches!(n, SessionNotification::StateChanged { .. }))
        .collect();
    assert!(leftovers.is_empty(), "duplicate transitions: {:?}", leftovers);
}
