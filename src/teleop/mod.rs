//! Teleoperation control loop
//!
//! Runs once the stage is homed. Every tick samples the gamepad, turns the
//! bound inputs into relative moves and checks the terminate button:
//!
//! ```text
//! Idle ──start──► Running ──terminate button──► Terminating ──finish──► shutdown
//!                   │   ▲
//!                   └───┘ tick: poll → map → dispatch → terminate? → sleep
//! ```
//!
//! A failed move is logged and counted; the loop keeps running.

pub mod dispatcher;
pub mod engine;

pub use dispatcher::MotionDispatcher;
pub use engine::{ControlLoop, LoopOutcome, TickOutcome};

use chrono::{DateTime, Local};
use std::time::Duration;

/// Lower bound for the tick interval, keeps the controller command queue from saturating
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Fixed parameters of one control loop run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopSettings {
    /// Full digital step; analog moves are a fraction of it
    pub step_size: f64,
    pub command_timeout: Duration,
    pub tick_interval: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            command_timeout: Duration::from_millis(60_000),
            tick_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoopStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub failed_commands: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
}

impl Default for LoopStats {
    fn default() -> Self {
        Self {
            ticks: 0,
            dispatched: 0,
            failed_commands: 0,
            started_at: Local::now(),
            finished_at: None,
        }
    }
}
