use super::{CHANNELS_PER_CONTROLLER, CONTROLLER_COUNT};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Logical degree of freedom of the stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

impl Axis {
    /// Fixed startup order: first controller X, Y, Z; second controller Roll, Pitch, Yaw
    pub const ALL: [Axis; CONTROLLER_COUNT * CHANNELS_PER_CONTROLLER as usize] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Roll,
        Axis::Pitch,
        Axis::Yaw,
    ];

    /// Axes driven by the controller in `slot`, channel 1 first
    pub fn on_controller(slot: usize) -> &'static [Axis] {
        let all: &'static [Axis] = &Axis::ALL;
        all.chunks(CHANNELS_PER_CONTROLLER as usize)
            .nth(slot)
            .unwrap_or(&[])
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
            Axis::Z => write!(f, "Z"),
            Axis::Roll => write!(f, "Roll"),
            Axis::Pitch => write!(f, "Pitch"),
            Axis::Yaw => write!(f, "Yaw"),
        }
    }
}
