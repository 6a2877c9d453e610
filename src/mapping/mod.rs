//! Translation of gamepad state into relative stage moves.
//!
//! The [`AxisMappingTable`] is read once per control loop tick. Digital
//! bindings produce a full step, analog bindings a step scaled by how far the
//! stick is deflected past the deadzone:
//!
//! ```text
//! InputDevice ──► [AxisMappingTable] ──► MotionRequest ──► MotionCommand
//!                  digital, analog        (axis, dir, mag)   (+ timeout)
//! ```

pub mod error;
pub mod table;

pub use error::MappingError;
pub use table::{scale, AnalogBinding, AxisMappingTable, DigitalBinding, DEFAULT_DEADZONE};

use crate::hardware::MotorDirection;
use crate::stage::Axis;
use std::time::Duration;

/// Motion wanted by the operator on one axis during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionRequest {
    pub axis: Axis,
    pub direction: MotorDirection,
    /// Move distance in stage units (a fraction of the configured step size)
    pub magnitude: f64,
}

impl MotionRequest {
    pub fn with_timeout(self, timeout: Duration) -> MotionCommand {
        MotionCommand {
            axis: self.axis,
            direction: self.direction,
            magnitude: self.magnitude,
            timeout,
        }
    }
}

/// Relative move ready to be issued against a channel. Lives for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCommand {
    pub axis: Axis,
    pub direction: MotorDirection,
    pub magnitude: f64,
    pub timeout: Duration,
}
