//! Shutdown sequencer.
//!
//! Takes ownership of the controllers so it can only run once for a given
//! stage. Every channel gets a stop-polling request and every connected
//! controller a disconnect, whatever failed before. Failures are logged and
//! collected, never returned.

use super::channel::{ConnectionState, Controller};
use super::error::ShutdownError;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub channels_stopped: usize,
    pub controllers_disconnected: usize,
    pub errors: Vec<ShutdownError>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn run(mut controllers: Vec<Controller>) -> ShutdownReport {
    info!("Shutting down stage: {} controllers", controllers.len());
    let mut report = ShutdownReport::default();

    for controller in controllers.iter_mut() {
        for channel in controller.channels_mut() {
            match channel.stop_polling() {
                Ok(()) => report.channels_stopped += 1,
                Err(source) => {
                    let e = ShutdownError::StopPolling {
                        axis: channel.axis(),
                        source,
                    };
                    warn!("{}", e);
                    report.errors.push(e);
                }
            }
        }
    }

    for controller in controllers.iter_mut() {
        if controller.state() != ConnectionState::Connected {
            continue;
        }
        match controller.disconnect() {
            Ok(()) => {
                info!("Disconnected controller {}", controller.serial());
                report.controllers_disconnected += 1;
            }
            Err(source) => {
                let e = ShutdownError::Disconnect {
                    serial: controller.serial().to_string(),
                    source,
                };
                warn!("{}", e);
                report.errors.push(e);
            }
        }
    }

    info!(
        "Shutdown complete: {} channels stopped, {} controllers disconnected, {} errors",
        report.channels_stopped,
        report.controllers_disconnected,
        report.errors.len()
    );
    report
}
