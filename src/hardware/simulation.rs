//! Simulated stepper controllers.
//!
//! Software stand-in for the benchtop controllers so the whole startup and
//! teleoperation path can run without hardware attached. Each controller has
//! three channels. Channel state is shared between the controller and the
//! handles it gives out, so a disconnect is visible to every handle.

use super::{
    ControllerDevice, MotionControllerService, MotorChannel, MotorConfiguration, MotorDirection,
    ServiceError,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, info, warn};

const SIMULATED_CHANNELS: u8 = 3;

/// Behaviour knobs for the simulated controllers
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    /// Number of settings waits a channel needs before it reports initialized
    pub settings_init_waits: u32,
    /// Channel device ids (`<serial>-<channel>`) that reject home and move commands
    pub faulty_channels: Vec<String>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            settings_init_waits: 1,
            faulty_channels: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct SimChannelState {
    waits: u32,
    polling: bool,
    enabled: bool,
    homed: bool,
    settings_name: Option<String>,
    position: f64,
}

struct SimChannel {
    device_id: String,
    required_waits: u32,
    faulty: bool,
    connected: Rc<Cell<bool>>,
    state: Rc<RefCell<SimChannelState>>,
}

impl SimChannel {
    fn ensure_connected(&self) -> Result<(), ServiceError> {
        if self.connected.get() {
            Ok(())
        } else {
            Err(ServiceError::NotConnected)
        }
    }

    fn ensure_ready(&self, timeout_ms: u64) -> Result<(), ServiceError> {
        self.ensure_connected()?;
        let state = self.state.borrow();
        if !state.polling || !state.enabled {
            return Err(ServiceError::Fault(format!(
                "{} is not polling and enabled",
                self.device_id
            )));
        }
        if self.faulty {
            return Err(ServiceError::Timeout(timeout_ms));
        }
        Ok(())
    }
}

impl MotorChannel for SimChannel {
    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn description(&self) -> String {
        format!("Simulated Stepper Motor Channel {}", self.device_id)
    }

    fn is_settings_initialized(&self) -> bool {
        self.state.borrow().waits >= self.required_waits
    }

    fn wait_settings_initialized(&mut self, timeout_ms: u64) {
        debug!(
            "Simulated settings wait on {} (timeout {}ms)",
            self.device_id, timeout_ms
        );
        self.state.borrow_mut().waits += 1;
    }

    fn start_polling(&mut self, interval_ms: u64) -> Result<(), ServiceError> {
        self.ensure_connected()?;
        debug!("{} polling every {}ms", self.device_id, interval_ms);
        self.state.borrow_mut().polling = true;
        Ok(())
    }

    fn stop_polling(&mut self) -> Result<(), ServiceError> {
        self.state.borrow_mut().polling = false;
        Ok(())
    }

    fn enable(&mut self) -> Result<(), ServiceError> {
        self.ensure_connected()?;
        let mut state = self.state.borrow_mut();
        if !state.polling {
            return Err(ServiceError::Fault(format!(
                "{} cannot be enabled before polling",
                self.device_id
            )));
        }
        state.enabled = true;
        Ok(())
    }

    fn load_configuration(&mut self, device_id: &str) -> Result<MotorConfiguration, ServiceError> {
        self.ensure_connected()?;
        Ok(MotorConfiguration {
            device_id: device_id.to_string(),
            settings_name: String::new(),
        })
    }

    fn apply_settings(&mut self, config: &MotorConfiguration) -> Result<(), ServiceError> {
        self.ensure_connected()?;
        self.state.borrow_mut().settings_name = Some(config.settings_name.clone());
        Ok(())
    }

    fn home(&mut self, timeout_ms: u64) -> Result<(), ServiceError> {
        self.ensure_ready(timeout_ms)?;
        let mut state = self.state.borrow_mut();
        state.position = 0.0;
        state.homed = true;
        Ok(())
    }

    fn move_relative(
        &mut self,
        direction: MotorDirection,
        magnitude: f64,
        timeout_ms: u64,
    ) -> Result<(), ServiceError> {
        self.ensure_ready(timeout_ms)?;
        let mut state = self.state.borrow_mut();
        if !state.homed {
            return Err(ServiceError::Fault(format!(
                "{} has not been homed",
                self.device_id
            )));
        }
        state.position += direction.sign() * magnitude;
        debug!("{} now at {:.5}", self.device_id, state.position);
        Ok(())
    }
}

struct SimDevice {
    serial: String,
    connected: Rc<Cell<bool>>,
    channels: Vec<Rc<RefCell<SimChannelState>>>,
    settings: SimulationSettings,
}

impl ControllerDevice for SimDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn channel(&mut self, index: u8) -> Result<Box<dyn MotorChannel>, ServiceError> {
        if !self.connected.get() {
            return Err(ServiceError::NotConnected);
        }
        let state = index
            .checked_sub(1)
            .and_then(|slot| self.channels.get(slot as usize))
            .ok_or_else(|| {
                ServiceError::Fault(format!("{} has no channel {}", self.serial, index))
            })?;
        let device_id = format!("{}-{}", self.serial, index);

        Ok(Box::new(SimChannel {
            faulty: self.settings.faulty_channels.contains(&device_id),
            device_id,
            required_waits: self.settings.settings_init_waits,
            connected: self.connected.clone(),
            state: state.clone(),
        }))
    }

    fn disconnect(&mut self) -> Result<(), ServiceError> {
        if !self.connected.replace(false) {
            warn!("Simulated controller {} was already disconnected", self.serial);
        }
        info!("Simulated controller {} disconnected", self.serial);
        Ok(())
    }
}

/// In-memory controller transport
pub struct SimulatedMotionService {
    known_serials: Vec<String>,
    listed: HashSet<String>,
    settings: SimulationSettings,
}

impl SimulatedMotionService {
    pub fn new(known_serials: Vec<String>, settings: SimulationSettings) -> Self {
        Self {
            known_serials,
            listed: HashSet::new(),
            settings,
        }
    }
}

impl MotionControllerService for SimulatedMotionService {
    fn build_device_list(&mut self) -> Result<(), ServiceError> {
        self.listed = self.known_serials.iter().cloned().collect();
        info!("Simulated device list: {:?}", self.known_serials);
        Ok(())
    }

    fn connect(&mut self, serial: &str) -> Result<Box<dyn ControllerDevice>, ServiceError> {
        if !self.listed.contains(serial) {
            return Err(ServiceError::DeviceNotFound(serial.to_string()));
        }

        let channels = (0..SIMULATED_CHANNELS)
            .map(|_| Rc::new(RefCell::new(SimChannelState::default())))
            .collect();

        Ok(Box::new(SimDevice {
            serial: serial.to_string(),
            connected: Rc::new(Cell::new(true)),
            channels,
            settings: self.settings.clone(),
        }))
    }
}
