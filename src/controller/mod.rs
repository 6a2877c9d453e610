//! Controller subsystem for handheld gamepad input
//!
//! The teleoperation loop samples the gamepad once per tick through the
//! [`InputDevice`] trait:
//!
//! ```text
//! Gamepad ──► gilrs events ──► cached state ──► button(i) / axis(i)
//!             (poll_events)
//! ```
//!
//! Buttons and axes are addressed by index so the binding table stays
//! independent of the driver. [`gamepad`] documents the index layout.

pub mod gamepad;

pub use gamepad::{GamepadInput, AXIS_COUNT, BUTTON_COUNT};

/// Polled view of a gamepad.
///
/// `poll_events` refreshes the cached state. `button` and `axis` only read that
/// cache and never block.
pub trait InputDevice {
    fn poll_events(&mut self);

    fn button(&self, index: usize) -> bool;

    /// Analog value in `[-1.0, 1.0]`; unknown indices read as `0.0`
    fn axis(&self, index: usize) -> f64;
}

// Input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Failed to initialize input driver: {0}")]
    InitializationError(String),

    #[error("No gamepad connected")]
    NoGamepad,

    #[error("Gamepad {requested} not found ({available} connected)")]
    GamepadNotFound { requested: usize, available: usize },
}
