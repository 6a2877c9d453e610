//! Six-axis stage bring-up and teardown
//!
//! The stage lifecycle is a statum typestate machine. Each transition is one
//! startup phase and only succeeds once every channel completed it:
//!
//! ```text
//! connect ──► Connected ──initialize──► Initialized ──home_all──► Homed
//!    │            │                         │                       │
//!    └────────────┴──────── on error ───────┴──── shutdown ◄────────┘
//! ```
//!
//! 1. [`registry`] - connects both controllers and binds X, Y, Z, Roll, Pitch, Yaw
//! 2. [`initializer`] - settings, polling, enable and motor configuration per channel
//! 3. [`homing`] - homes every axis in order
//! 4. [`shutdown`] - stops polling and disconnects, exactly once per stage
//!
//! A failing transition consumes the stage, runs the shutdown sequence on what
//! was brought up so far and returns a [`StartupFailure`]. Relative moves exist
//! only on `Stage<Homed>`.

pub mod axis;
pub mod channel;
pub mod deadline;
pub mod error;
pub mod homing;
pub mod initializer;
pub mod registry;
pub mod shutdown;

#[cfg(test)]
pub mod testing;

pub use axis::Axis;
pub use channel::{AxisChannel, ChannelStatus, Controller};
pub use deadline::Deadline;
pub use error::{
    ChannelError, ConnectionError, HomingError, InitError, MoveError, ShutdownError, StartupError,
    StartupFailure,
};
pub use shutdown::ShutdownReport;

use crate::mapping::MotionCommand;
use statum::{machine, state};
use std::time::Duration;
use tracing::{debug, error};

/// Controllers per stage
pub const CONTROLLER_COUNT: usize = 2;

/// Channels used on each controller
pub const CHANNELS_PER_CONTROLLER: u8 = 3;

// Controller-side configuration keeps propagating after connect; channels
// opened earlier report stale settings.
pub const CONNECT_SETTLE: Duration = Duration::from_millis(250);

/// Upper bound for a channel to report initialized settings
pub const SETTINGS_INIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest single blocking settings wait handed to the device
pub const SETTINGS_WAIT_SLICE: Duration = Duration::from_millis(250);

/// Pause between settings checks
pub const SETTINGS_RECHECK: Duration = Duration::from_millis(50);

/// Device status polling interval
pub const POLLING_INTERVAL: Duration = Duration::from_millis(250);

// The first status polls must land before the channel accepts enable.
pub const POLLING_SETTLE: Duration = Duration::from_millis(500);

// Drive power needs to come up before the configuration is written.
pub const ENABLE_SETTLE: Duration = Duration::from_millis(250);

// Hardware safety bound for a full homing run. Do not shorten.
pub const HOME_TIMEOUT: Duration = Duration::from_secs(60);

#[state]
#[derive(Debug, Clone)]
pub enum StageState {
    Connected,
    Initialized,
    Homed,
}

#[machine]
pub struct Stage<S: StageState> {
    controllers: Vec<Controller>,
}

impl<S: StageState> Stage<S> {
    pub fn controllers(&self) -> &[Controller] {
        &self.controllers
    }

    /// Channels in axis order
    pub fn channels(&self) -> impl Iterator<Item = &AxisChannel> + '_ {
        self.controllers.iter().flat_map(|c| c.channels().iter())
    }

    fn channels_mut(&mut self) -> impl Iterator<Item = &mut AxisChannel> + '_ {
        self.controllers
            .iter_mut()
            .flat_map(|c| c.channels_mut().iter_mut())
    }

    fn channel_mut(&mut self, axis: Axis) -> Option<&mut AxisChannel> {
        self.channels_mut().find(|c| c.axis() == axis)
    }

    /// Stops polling on every channel and disconnects every controller
    pub fn shutdown(self) -> ShutdownReport {
        shutdown::run(self.controllers)
    }

    fn abort(self, error: impl Into<StartupError>) -> StartupFailure {
        let error = error.into();
        error!("Stage startup aborted: {}", error);
        StartupFailure {
            error,
            shutdown: self.shutdown(),
        }
    }
}

impl Stage<Homed> {
    pub fn move_relative(&mut self, command: &MotionCommand) -> Result<(), MoveError> {
        let channel = self
            .channel_mut(command.axis)
            .ok_or(MoveError::Unbound(command.axis))?;
        debug!(
            "Moving {} {} by {:.5}",
            command.axis, command.direction, command.magnitude
        );
        channel.move_relative(command.direction, command.magnitude, command.timeout)
    }
}
