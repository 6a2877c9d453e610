//! Motion controller service boundary
//!
//! The stage never talks to a transport directly. Everything it needs from the
//! multi-channel stepper controllers goes through the three traits below:
//!
//! ```text
//! MotionControllerService ──connect(serial)──► ControllerDevice
//!                                                 │
//!                                          channel(1..=3)
//!                                                 ▼
//!                                           MotorChannel
//! ```
//!
//! All calls are blocking and carry their own hardware timeout. The service may
//! run background polling threads per channel; callers only see cached state.

pub mod simulation;

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Direction of a relative move as understood by the motor firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotorDirection {
    Forward,
    Backward,
}

impl MotorDirection {
    /// Sign applied to a position when moving in this direction
    pub fn sign(self) -> f64 {
        match self {
            MotorDirection::Forward => 1.0,
            MotorDirection::Backward => -1.0,
        }
    }
}

impl Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorDirection::Forward => write!(f, "Forward"),
            MotorDirection::Backward => write!(f, "Backward"),
        }
    }
}

/// Motor configuration as loaded from the controller's settings store.
///
/// `settings_name` selects the stage profile the firmware applies; it is
/// rewritten before [`MotorChannel::apply_settings`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorConfiguration {
    pub device_id: String,
    pub settings_name: String,
}

// Errors reported by the controller service
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device list unavailable: {0}")]
    DeviceList(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Device fault: {0}")]
    Fault(String),

    #[error("Device is not connected")]
    NotConnected,
}

/// Entry point into the controller transport.
pub trait MotionControllerService {
    /// Refreshes the list of controllers visible on the transport
    fn build_device_list(&mut self) -> Result<(), ServiceError>;

    /// Creates and connects the controller with the given serial
    fn connect(&mut self, serial: &str) -> Result<Box<dyn ControllerDevice>, ServiceError>;
}

/// One connected multi-channel controller.
pub trait ControllerDevice {
    fn serial(&self) -> &str;

    /// Returns the channel handle for a 1-based channel index
    fn channel(&mut self, index: u8) -> Result<Box<dyn MotorChannel>, ServiceError>;

    fn disconnect(&mut self) -> Result<(), ServiceError>;
}

/// Hardware channel driving a single stage axis.
pub trait MotorChannel {
    /// Identifier the controller reports for this channel
    fn device_id(&self) -> String;

    /// Human readable description from the device info block
    fn description(&self) -> String;

    fn is_settings_initialized(&self) -> bool;

    /// Blocks until settings are initialized or `timeout_ms` elapsed
    fn wait_settings_initialized(&mut self, timeout_ms: u64);

    fn start_polling(&mut self, interval_ms: u64) -> Result<(), ServiceError>;

    fn stop_polling(&mut self) -> Result<(), ServiceError>;

    fn enable(&mut self) -> Result<(), ServiceError>;

    fn load_configuration(&mut self, device_id: &str) -> Result<MotorConfiguration, ServiceError>;

    fn apply_settings(&mut self, config: &MotorConfiguration) -> Result<(), ServiceError>;

    fn home(&mut self, timeout_ms: u64) -> Result<(), ServiceError>;

    fn move_relative(
        &mut self,
        direction: MotorDirection,
        magnitude: f64,
        timeout_ms: u64,
    ) -> Result<(), ServiceError>;
}
