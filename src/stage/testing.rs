//! Recording test doubles for the controller and input services.
//!
//! Every hardware call lands in a shared call log so tests can assert on the
//! exact sequence the stage issued.

use crate::controller::InputDevice;
use crate::hardware::{
    ControllerDevice, MotionControllerService, MotorChannel, MotorConfiguration, MotorDirection,
    ServiceError,
};
use crate::stage::CONTROLLER_COUNT;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub fn serials() -> [String; CONTROLLER_COUNT] {
    ["70214254".to_string(), "70205184".to_string()]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BuildDeviceList,
    Connect(String),
    Channel(String, u8),
    WaitSettings(String),
    StartPolling(String, u64),
    Enable(String),
    LoadConfiguration(String),
    ApplySettings(String, String),
    Home(String, u64),
    Move(String, MotorDirection, f64, u64),
    StopPolling(String),
    Disconnect(String),
}

impl Call {
    /// Channel device id for channel-level calls
    pub fn device_id(&self) -> Option<&str> {
        match self {
            Call::WaitSettings(id)
            | Call::StartPolling(id, _)
            | Call::Enable(id)
            | Call::LoadConfiguration(id)
            | Call::ApplySettings(id, _)
            | Call::Home(id, _)
            | Call::Move(id, ..)
            | Call::StopPolling(id) => Some(id),
            _ => None,
        }
    }
}

/// Failure injection, keyed by serial or channel device id (`<serial>-<n>`)
#[derive(Debug, Default)]
pub struct Behavior {
    pub missing: Vec<String>,
    pub uninitialized: Vec<String>,
    pub failing_enable: Vec<String>,
    pub failing_home: Vec<String>,
    pub failing_stop: Vec<String>,
    pub failing_disconnect: Vec<String>,
    /// Remaining failing moves per channel
    pub failing_moves: HashMap<String, u32>,
}

#[derive(Default)]
struct Shared {
    calls: Vec<Call>,
    behavior: Behavior,
}

type SharedState = Rc<RefCell<Shared>>;

fn record(shared: &SharedState, call: Call) {
    shared.borrow_mut().calls.push(call);
}

#[derive(Default)]
pub struct RecordingService {
    shared: SharedState,
}

impl RecordingService {
    pub fn behavior(&mut self, configure: impl FnOnce(&mut Behavior)) {
        configure(&mut self.shared.borrow_mut().behavior);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.borrow().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.shared.borrow().calls.iter().filter(|c| predicate(c)).count()
    }
}

impl MotionControllerService for RecordingService {
    fn build_device_list(&mut self) -> Result<(), ServiceError> {
        record(&self.shared, Call::BuildDeviceList);
        Ok(())
    }

    fn connect(&mut self, serial: &str) -> Result<Box<dyn ControllerDevice>, ServiceError> {
        record(&self.shared, Call::Connect(serial.to_string()));
        if self.shared.borrow().behavior.missing.iter().any(|s| s == serial) {
            return Err(ServiceError::DeviceNotFound(serial.to_string()));
        }
        Ok(Box::new(RecordingDevice {
            serial: serial.to_string(),
            shared: self.shared.clone(),
        }))
    }
}

struct RecordingDevice {
    serial: String,
    shared: SharedState,
}

impl ControllerDevice for RecordingDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    fn channel(&mut self, index: u8) -> Result<Box<dyn MotorChannel>, ServiceError> {
        record(&self.shared, Call::Channel(self.serial.clone(), index));
        Ok(Box::new(RecordingChannel {
            device_id: format!("{}-{}", self.serial, index),
            waits: 0,
            shared: self.shared.clone(),
        }))
    }

    fn disconnect(&mut self) -> Result<(), ServiceError> {
        record(&self.shared, Call::Disconnect(self.serial.clone()));
        if self
            .shared
            .borrow()
            .behavior
            .failing_disconnect
            .contains(&self.serial)
        {
            return Err(ServiceError::Fault("disconnect refused".into()));
        }
        Ok(())
    }
}

struct RecordingChannel {
    device_id: String,
    waits: u32,
    shared: SharedState,
}

impl RecordingChannel {
    fn listed(&self, list: impl Fn(&Behavior) -> &Vec<String>) -> bool {
        list(&self.shared.borrow().behavior).contains(&self.device_id)
    }
}

impl MotorChannel for RecordingChannel {
    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn description(&self) -> String {
        format!("Recording channel {}", self.device_id)
    }

    fn is_settings_initialized(&self) -> bool {
        self.waits > 0 && !self.listed(|b| &b.uninitialized)
    }

    fn wait_settings_initialized(&mut self, _timeout_ms: u64) {
        record(&self.shared, Call::WaitSettings(self.device_id.clone()));
        self.waits += 1;
    }

    fn start_polling(&mut self, interval_ms: u64) -> Result<(), ServiceError> {
        record(
            &self.shared,
            Call::StartPolling(self.device_id.clone(), interval_ms),
        );
        Ok(())
    }

    fn stop_polling(&mut self) -> Result<(), ServiceError> {
        record(&self.shared, Call::StopPolling(self.device_id.clone()));
        if self.listed(|b| &b.failing_stop) {
            return Err(ServiceError::Fault("stop refused".into()));
        }
        Ok(())
    }

    fn enable(&mut self) -> Result<(), ServiceError> {
        record(&self.shared, Call::Enable(self.device_id.clone()));
        if self.listed(|b| &b.failing_enable) {
            return Err(ServiceError::Fault("enable refused".into()));
        }
        Ok(())
    }

    fn load_configuration(&mut self, device_id: &str) -> Result<MotorConfiguration, ServiceError> {
        record(&self.shared, Call::LoadConfiguration(device_id.to_string()));
        Ok(MotorConfiguration {
            device_id: device_id.to_string(),
            settings_name: String::new(),
        })
    }

    fn apply_settings(&mut self, config: &MotorConfiguration) -> Result<(), ServiceError> {
        record(
            &self.shared,
            Call::ApplySettings(self.device_id.clone(), config.settings_name.clone()),
        );
        Ok(())
    }

    fn home(&mut self, timeout_ms: u64) -> Result<(), ServiceError> {
        record(&self.shared, Call::Home(self.device_id.clone(), timeout_ms));
        if self.listed(|b| &b.failing_home) {
            return Err(ServiceError::Timeout(timeout_ms));
        }
        Ok(())
    }

    fn move_relative(
        &mut self,
        direction: MotorDirection,
        magnitude: f64,
        timeout_ms: u64,
    ) -> Result<(), ServiceError> {
        record(
            &self.shared,
            Call::Move(self.device_id.clone(), direction, magnitude, timeout_ms),
        );
        let mut shared = self.shared.borrow_mut();
        if let Some(remaining) = shared.behavior.failing_moves.get_mut(&self.device_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ServiceError::Timeout(timeout_ms));
            }
        }
        Ok(())
    }
}

/// Input state for one tick
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub buttons: Vec<usize>,
    pub axes: Vec<(usize, f64)>,
}

impl Frame {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn buttons(buttons: &[usize]) -> Self {
        Self {
            buttons: buttons.to_vec(),
            axes: Vec::new(),
        }
    }

    pub fn axes(axes: &[(usize, f64)]) -> Self {
        Self {
            buttons: Vec::new(),
            axes: axes.to_vec(),
        }
    }
}

/// Replays one frame per `poll_events`; the last frame repeats
pub struct ScriptedInput {
    frames: Vec<Frame>,
    polls: Rc<Cell<usize>>,
}

impl ScriptedInput {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            polls: Rc::new(Cell::new(0)),
        }
    }

    /// Shared poll counter, readable after the input has been moved
    pub fn polls(&self) -> Rc<Cell<usize>> {
        self.polls.clone()
    }

    fn current(&self) -> Option<&Frame> {
        let polled = self.polls.get();
        if polled == 0 {
            return None;
        }
        self.frames.get(polled - 1).or_else(|| self.frames.last())
    }
}

impl InputDevice for ScriptedInput {
    fn poll_events(&mut self) {
        self.polls.set(self.polls.get() + 1);
    }

    fn button(&self, index: usize) -> bool {
        self.current()
            .map(|f| f.buttons.contains(&index))
            .unwrap_or(false)
    }

    fn axis(&self, index: usize) -> f64 {
        self.current()
            .and_then(|f| f.axes.iter().find(|(i, _)| *i == index).map(|(_, v)| *v))
            .unwrap_or(0.0)
    }
}
