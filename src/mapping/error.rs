//! Errors for the axis mapping table

use crate::stage::Axis;
use thiserror::Error;

/// Rejections raised when validating a binding table
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    /// Axis has no binding at all
    #[error("Axis {0} is not bound to any input")]
    UnboundAxis(Axis),

    /// Axis appears in more than one binding
    #[error("Axis {0} is bound more than once")]
    DuplicateAxis(Axis),

    /// Forward and backward use the same button
    #[error("Axis {axis} uses button {button} for both directions")]
    SharedDirectionButton { axis: Axis, button: usize },

    /// Button drives more than one axis
    #[error("Button {0} is bound more than once")]
    DuplicateButton(usize),

    /// Analog input drives more than one axis
    #[error("Analog input {0} is bound more than once")]
    DuplicateAnalogInput(usize),

    /// Index outside the gamepad's button layout
    #[error("Button {0} does not exist on the gamepad")]
    UnknownButton(usize),

    #[error("Analog input {0} does not exist on the gamepad")]
    UnknownAnalogInput(usize),

    #[error("Terminate button {0} is also bound to an axis")]
    TerminateButtonBound(usize),

    #[error("Deadzone {0} is outside [0, 1)")]
    InvalidDeadzone(f64),
}
