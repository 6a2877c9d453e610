//! Channel handles and controller records.
//!
//! [`AxisChannel`] wraps the service's channel handle and refuses calls that
//! would break the bring-up order:
//!
//! ```text
//! settings initialized ──► polling ──► enabled ──► homed ──► relative moves
//! ```

use super::axis::Axis;
use super::error::{ChannelError, MoveError};
use crate::hardware::{ControllerDevice, MotorChannel, MotorDirection, ServiceError};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollingState {
    #[default]
    Stopped,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnableState {
    #[default]
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomeState {
    #[default]
    NotHomed,
    Homed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStatus {
    pub settings_initialized: bool,
    pub polling: PollingState,
    pub enabled: EnableState,
    pub homed: HomeState,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// One stage axis bound to its hardware channel
pub struct AxisChannel {
    axis: Axis,
    // Serial of the owning controller
    device_serial: String,
    index: u8,
    handle: Box<dyn MotorChannel>,
    status: ChannelStatus,
}

impl AxisChannel {
    pub fn new(axis: Axis, device_serial: String, index: u8, handle: Box<dyn MotorChannel>) -> Self {
        Self {
            axis,
            device_serial,
            index,
            handle,
            status: ChannelStatus::default(),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn device_serial(&self) -> &str {
        &self.device_serial
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    pub fn description(&self) -> String {
        self.handle.description()
    }

    fn service_error(&self, source: ServiceError) -> ChannelError {
        ChannelError::Service {
            axis: self.axis,
            source,
        }
    }

    fn out_of_order(&self, operation: &'static str, requirement: &'static str) -> ChannelError {
        ChannelError::OutOfOrder {
            axis: self.axis,
            operation,
            requirement,
        }
    }

    /// Reads the cached settings flag from the device
    pub fn refresh_settings_initialized(&mut self) -> bool {
        self.status.settings_initialized = self.handle.is_settings_initialized();
        self.status.settings_initialized
    }

    pub fn wait_settings_initialized(&mut self, timeout: Duration) {
        self.handle.wait_settings_initialized(millis(timeout));
    }

    pub fn start_polling(&mut self, interval: Duration) -> Result<(), ChannelError> {
        if !self.status.settings_initialized {
            return Err(self.out_of_order("start polling", "initialized settings"));
        }
        self.handle
            .start_polling(millis(interval))
            .map_err(|e| self.service_error(e))?;
        self.status.polling = PollingState::Polling;
        Ok(())
    }

    pub fn enable(&mut self) -> Result<(), ChannelError> {
        if self.status.polling != PollingState::Polling {
            return Err(self.out_of_order("enable", "active polling"));
        }
        self.handle.enable().map_err(|e| self.service_error(e))?;
        self.status.enabled = EnableState::Enabled;
        Ok(())
    }

    /// Loads the channel's motor configuration, points it at the
    /// `<stage_model>/<device id>` settings profile and applies it.
    pub fn configure(&mut self, stage_model: &str) -> Result<String, ChannelError> {
        if self.status.enabled != EnableState::Enabled {
            return Err(self.out_of_order("load configuration", "an enabled channel"));
        }
        let device_id = self.handle.device_id();
        let mut config = self
            .handle
            .load_configuration(&device_id)
            .map_err(|e| self.service_error(e))?;
        config.settings_name = format!("{}/{}", stage_model, device_id);
        self.handle
            .apply_settings(&config)
            .map_err(|e| self.service_error(e))?;
        Ok(config.settings_name)
    }

    pub fn home(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        if self.status.enabled != EnableState::Enabled {
            return Err(self.out_of_order("home", "an enabled channel"));
        }
        self.handle
            .home(millis(timeout))
            .map_err(|e| self.service_error(e))?;
        self.status.homed = HomeState::Homed;
        Ok(())
    }

    pub fn move_relative(
        &mut self,
        direction: MotorDirection,
        magnitude: f64,
        timeout: Duration,
    ) -> Result<(), MoveError> {
        if self.status.homed != HomeState::Homed {
            return Err(MoveError::NotHomed(self.axis));
        }
        self.handle
            .move_relative(direction, magnitude, millis(timeout))
            .map_err(|source| MoveError::Rejected {
                axis: self.axis,
                source,
            })
    }

    pub fn stop_polling(&mut self) -> Result<(), ServiceError> {
        self.handle.stop_polling()?;
        debug!("Stopped polling on {}", self.axis);
        self.status.polling = PollingState::Stopped;
        Ok(())
    }
}

/// Connected multi-channel controller and the axes it drives
pub struct Controller {
    serial: String,
    state: ConnectionState,
    device: Box<dyn ControllerDevice>,
    channels: Vec<AxisChannel>,
}

impl Controller {
    pub fn new(device: Box<dyn ControllerDevice>) -> Self {
        Self {
            serial: device.serial().to_string(),
            state: ConnectionState::Connected,
            device,
            channels: Vec::new(),
        }
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn channels(&self) -> &[AxisChannel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [AxisChannel] {
        &mut self.channels
    }

    /// Opens channel `index` and binds it to `axis`
    pub fn bind_channel(&mut self, axis: Axis, index: u8) -> Result<(), ServiceError> {
        let handle = self.device.channel(index)?;
        self.channels
            .push(AxisChannel::new(axis, self.serial.clone(), index, handle));
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<(), ServiceError> {
        self.device.disconnect()?;
        self.state = ConnectionState::Disconnected;
        Ok(())
    }
}
