//! Static binding table from gamepad elements to stage axes.

use super::{MappingError, MotionRequest};
use crate::controller::{InputDevice, AXIS_COUNT, BUTTON_COUNT};
use crate::hardware::MotorDirection;
use crate::stage::Axis;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Analog values with a magnitude at or below this produce no motion
pub const DEFAULT_DEADZONE: f64 = 0.1;

/// Magnitude factor for an analog value: `|value|` outside the deadzone, `0.0` inside
pub fn scale(value: f64, deadzone: f64) -> f64 {
    if value.abs() > deadzone {
        value.abs()
    } else {
        0.0
    }
}

/// Two buttons stepping one axis forward and backward
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DigitalBinding {
    pub axis: Axis,
    pub forward_button: usize,
    pub backward_button: usize,
}

impl DigitalBinding {
    /// Forward wins when both buttons read pressed
    pub fn direction(&self, input: &dyn InputDevice) -> Option<MotorDirection> {
        if input.button(self.forward_button) {
            Some(MotorDirection::Forward)
        } else if input.button(self.backward_button) {
            Some(MotorDirection::Backward)
        } else {
            None
        }
    }
}

/// One analog input driving one axis proportionally
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AnalogBinding {
    pub axis: Axis,
    pub input_axis: usize,
}

impl AnalogBinding {
    /// Direction and scale factor, `None` inside the deadzone
    pub fn sample(&self, input: &dyn InputDevice, deadzone: f64) -> Option<(MotorDirection, f64)> {
        let value = input.axis(self.input_axis);
        let factor = scale(value, deadzone);
        if factor == 0.0 {
            return None;
        }
        let direction = if value > 0.0 {
            MotorDirection::Forward
        } else {
            MotorDirection::Backward
        };
        Some((direction, factor))
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AxisMappingTable {
    pub terminate_button: usize,
    pub deadzone: f64,
    pub digital: Vec<DigitalBinding>,
    pub analog: Vec<AnalogBinding>,
}

impl Default for AxisMappingTable {
    fn default() -> Self {
        Self::default_config()
    }
}

impl AxisMappingTable {
    /// Xbox layout: X on X/Y buttons, Y on A/B, Z/Roll on the left stick,
    /// Pitch/Yaw on the right stick, Start terminates.
    pub fn default_config() -> Self {
        Self {
            terminate_button: 7,
            deadzone: DEFAULT_DEADZONE,
            digital: vec![
                DigitalBinding {
                    axis: Axis::X,
                    forward_button: 2,
                    backward_button: 3,
                },
                DigitalBinding {
                    axis: Axis::Y,
                    forward_button: 0,
                    backward_button: 1,
                },
            ],
            analog: vec![
                AnalogBinding {
                    axis: Axis::Z,
                    input_axis: 0,
                },
                AnalogBinding {
                    axis: Axis::Roll,
                    input_axis: 1,
                },
                AnalogBinding {
                    axis: Axis::Pitch,
                    input_axis: 2,
                },
                AnalogBinding {
                    axis: Axis::Yaw,
                    input_axis: 3,
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        if !(0.0..1.0).contains(&self.deadzone) {
            return Err(MappingError::InvalidDeadzone(self.deadzone));
        }

        if self.terminate_button >= BUTTON_COUNT {
            return Err(MappingError::UnknownButton(self.terminate_button));
        }

        let mut axes = HashSet::new();
        let bound_axes = self
            .digital
            .iter()
            .map(|b| b.axis)
            .chain(self.analog.iter().map(|b| b.axis));
        for axis in bound_axes {
            if !axes.insert(axis) {
                return Err(MappingError::DuplicateAxis(axis));
            }
        }
        if let Some(axis) = Axis::ALL.into_iter().find(|a| !axes.contains(a)) {
            return Err(MappingError::UnboundAxis(axis));
        }

        let mut buttons = HashSet::new();
        for binding in &self.digital {
            if binding.forward_button == binding.backward_button {
                return Err(MappingError::SharedDirectionButton {
                    axis: binding.axis,
                    button: binding.forward_button,
                });
            }
            for button in [binding.forward_button, binding.backward_button] {
                if button >= BUTTON_COUNT {
                    return Err(MappingError::UnknownButton(button));
                }
                if button == self.terminate_button {
                    return Err(MappingError::TerminateButtonBound(button));
                }
                if !buttons.insert(button) {
                    return Err(MappingError::DuplicateButton(button));
                }
            }
        }

        let mut inputs = HashSet::new();
        for binding in &self.analog {
            if binding.input_axis >= AXIS_COUNT {
                return Err(MappingError::UnknownAnalogInput(binding.input_axis));
            }
            if !inputs.insert(binding.input_axis) {
                return Err(MappingError::DuplicateAnalogInput(binding.input_axis));
            }
        }
        Ok(())
    }

    /// Motion requested by the current input state, digital bindings first,
    /// each group in table order
    pub fn sample(&self, input: &dyn InputDevice, step_size: f64) -> Vec<MotionRequest> {
        let mut requests = Vec::new();

        for binding in &self.digital {
            if let Some(direction) = binding.direction(input) {
                requests.push(MotionRequest {
                    axis: binding.axis,
                    direction,
                    magnitude: step_size,
                });
            }
        }

        for binding in &self.analog {
            if let Some((direction, factor)) = binding.sample(input, self.deadzone) {
                requests.push(MotionRequest {
                    axis: binding.axis,
                    direction,
                    magnitude: step_size * factor,
                });
            }
        }

        if !requests.is_empty() {
            debug!("Sampled {} motion requests", requests.len());
        }
        requests
    }

    pub fn terminate_requested(&self, input: &dyn InputDevice) -> bool {
        input.button(self.terminate_button)
    }
}
