//! gilrs-backed gamepad input.
//!
//! Index layout (Xbox style):
//!
//! | Button | Element     | Axis | Element                |
//! |--------|-------------|------|------------------------|
//! | 0      | South (A)   | 0    | Left stick horizontal  |
//! | 1      | East (B)    | 1    | Left stick vertical    |
//! | 2      | West (X)    | 2    | Right stick horizontal |
//! | 3      | North (Y)   | 3    | Right stick vertical   |
//! | 4      | Left bumper | 4    | Left trigger           |
//! | 5      | Right bumper| 5    | Right trigger          |
//! | 6      | Back        |      |                        |
//! | 7      | Start       |      |                        |
//! | 8      | Guide       |      |                        |
//! | 9      | Left thumb  |      |                        |
//! | 10     | Right thumb |      |                        |
//!
//! Vertical stick axes are reported positive when the stick is pulled down.

use super::{InputDevice, InputError};
use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use tracing::{debug, error, info, warn};

/// Buttons addressable by index
pub const BUTTON_COUNT: usize = 11;

/// Analog axes addressable by index
pub const AXIS_COUNT: usize = 6;

const BUTTON_LAYOUT: [Button; BUTTON_COUNT] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
];

// (axis, sign)
const AXIS_LAYOUT: [(Axis, f64); AXIS_COUNT] = [
    (Axis::LeftStickX, 1.0),
    (Axis::LeftStickY, -1.0),
    (Axis::RightStickX, 1.0),
    (Axis::RightStickY, -1.0),
    (Axis::LeftZ, 1.0),
    (Axis::RightZ, 1.0),
];

fn layout_button(index: usize) -> Option<Button> {
    BUTTON_LAYOUT.get(index).copied()
}

fn layout_axis(index: usize) -> Option<(Axis, f64)> {
    AXIS_LAYOUT.get(index).copied()
}

/// Reads through `read` while connected; a missing pad reads as `neutral`
fn when_connected<T>(connected: bool, neutral: T, read: impl FnOnce() -> T) -> T {
    if connected {
        read()
    } else {
        neutral
    }
}

fn normalize(raw: f32, sign: f64) -> f64 {
    (f64::from(raw) * sign).clamp(-1.0, 1.0)
}

pub struct GamepadInput {
    gilrs: Gilrs,
    active: GamepadId,
    connected: bool,
}

impl GamepadInput {
    /// Opens the gamepad at `index`, or the first connected one
    pub fn open(index: Option<usize>) -> Result<Self, InputError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(InputError::InitializationError(e.to_string()));
            }
        };

        let gamepads: Vec<(GamepadId, String)> = gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();

        if gamepads.is_empty() {
            return Err(InputError::NoGamepad);
        }

        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, name)) in gamepads.iter().enumerate() {
            info!("  [{}] ID: {}, Name: {}", idx, id, name);
        }

        let requested = index.unwrap_or(0);
        let (active, name) = gamepads
            .get(requested)
            .cloned()
            .ok_or(InputError::GamepadNotFound {
                requested,
                available: gamepads.len(),
            })?;
        info!("Selected gamepad: {} ({})", name, active);

        Ok(Self {
            gilrs,
            active,
            connected: true,
        })
    }
}

impl InputDevice for GamepadInput {
    fn poll_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if id != self.active {
                continue;
            }
            match event {
                EventType::Connected => {
                    info!("Gamepad {} reconnected", id);
                    self.connected = true;
                }
                EventType::Disconnected => {
                    warn!("Gamepad {} disconnected, input reads as neutral", id);
                    self.connected = false;
                }
                _ => debug!("Gamepad event: {:?}", event),
            }
        }
    }

    fn button(&self, index: usize) -> bool {
        when_connected(self.connected, false, || match layout_button(index) {
            Some(button) => self.gilrs.gamepad(self.active).is_pressed(button),
            None => false,
        })
    }

    fn axis(&self, index: usize) -> f64 {
        when_connected(self.connected, 0.0, || match layout_axis(index) {
            Some((axis, sign)) => normalize(self.gilrs.gamepad(self.active).value(axis), sign),
            None => 0.0,
        })
    }
}
