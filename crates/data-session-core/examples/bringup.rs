//! Drives a scripted radio through a full session lifecycle: bring-up, a
//! transient setup failure with an automatic retry, connect, and teardown.
//!
//! Run with `cargo run --example bringup` (add `RUST_LOG=debug` for the
//! controller's internal decisions).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use infra_common::logging::{setup_logging, LoggingConfig};
use rmodem_data_session_core::{
    DataSessionConfig, DataSessionController, FailCause, NetworkParams, RadioCommands,
    RadioTechnology, SessionNotification,
};

/// Radio stand-in: the first activation fails transiently, the second
/// succeeds.
struct DemoRadio {
    attempts: AtomicUsize,
}

#[async_trait]
impl RadioCommands for DemoRadio {
    async fn activate(&self, technology: RadioTechnology) -> Result<NetworkParams, FailCause> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        println!("radio: activate on {:?} (attempt {})", technology, attempt + 1);
        if attempt == 0 {
            Err(FailCause::SignalLost)
        } else {
            Ok(NetworkParams {
                interface_name: "ppp0".to_string(),
                ip_address: "10.0.0.2".to_string(),
                gateway: "10.0.0.1".to_string(),
                dns_servers: vec!["10.0.0.1".to_string()],
            })
        }
    }

    async fn deactivate(&self) {
        println!("radio: deactivate");
    }

    async fn set_radio_power(&self, on: bool) {
        println!("radio: power {}", if on { "on" } else { "off" });
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging(&LoggingConfig::default())?;

    let radio = Arc::new(DemoRadio {
        attempts: AtomicUsize::new(0),
    });
    let (handle, task) =
        DataSessionController::spawn(DataSessionConfig::default(), radio, None);

    let mut notifications = handle.subscribe();

    handle.on_radio_available()?;
    handle.on_records_loaded()?;
    handle.on_attached(RadioTechnology::EvdoRevA)?;

    while let Ok(notification) = notifications.recv().await {
        println!("notification: {:?}", notification);
        if let SessionNotification::Connected { params } = notification {
            println!("up on {} with address {}", params.interface_name, params.ip_address);
            break;
        }
    }

    handle.shutdown()?;
    task.await?;
    Ok(())
}
