//! Control loop with statum state machine
//!
//! ```text
//! Idle ──► Running ──► Terminating
//! ```
//!
//! `Running` owns the homed stage, the input device and the binding table.
//! Every tick polls the input, dispatches the sampled moves and then checks
//! the terminate button, so the terminating tick still dispatches its own
//! commands and nothing is issued after it.

use super::{LoopSettings, LoopStats, MotionDispatcher};
use crate::controller::InputDevice;
use crate::mapping::AxisMappingTable;
use crate::stage::{Homed, ShutdownReport, Stage};
use chrono::Local;
use statum::{machine, state};
use tracing::{debug, info};

#[state]
#[derive(Debug, Clone)]
pub enum LoopState {
    Idle,
    Running,
    Terminating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Terminate,
}

/// What a finished loop leaves behind
#[derive(Debug)]
pub struct LoopOutcome {
    pub stats: LoopStats,
    pub shutdown: ShutdownReport,
}

#[machine]
pub struct ControlLoop<S: LoopState> {
    stage: Stage<Homed>,
    input: Box<dyn InputDevice>,
    table: AxisMappingTable,
    settings: LoopSettings,
    dispatcher: MotionDispatcher,
    stats: LoopStats,
}

impl ControlLoop<Idle> {
    pub fn create(
        stage: Stage<Homed>,
        input: Box<dyn InputDevice>,
        table: AxisMappingTable,
        settings: LoopSettings,
    ) -> Self {
        let dispatcher = MotionDispatcher::new(settings.command_timeout);
        Self::new(
            stage,
            input,
            table,
            settings,
            dispatcher,
            LoopStats::default(),
        )
    }

    pub fn start(mut self) -> ControlLoop<Running> {
        info!(
            "Starting control loop (step {}, tick {:?}, command timeout {:?})",
            self.settings.step_size, self.settings.tick_interval, self.settings.command_timeout
        );
        self.stats.started_at = Local::now();
        self.transition()
    }
}

impl ControlLoop<Running> {
    /// One iteration: poll, map, dispatch, then the terminate check
    pub fn tick(&mut self) -> TickOutcome {
        self.input.poll_events();

        let requests = self
            .table
            .sample(self.input.as_ref(), self.settings.step_size);
        let (dispatched, failed) = self.dispatcher.dispatch_all(&mut self.stage, requests);

        self.stats.ticks += 1;
        self.stats.dispatched += dispatched;
        self.stats.failed_commands += failed;

        if self.table.terminate_requested(self.input.as_ref()) {
            info!("Terminate button pressed");
            TickOutcome::Terminate
        } else {
            TickOutcome::Continue
        }
    }

    /// Ticks every `tick_interval` until the terminate button is seen
    pub async fn run_until_terminate(mut self) -> ControlLoop<Terminating> {
        info!("Control loop running");

        let mut last_log_time = Local::now();
        let mut last_dispatched = 0;
        let log_interval = chrono::Duration::seconds(10);

        loop {
            if self.tick() == TickOutcome::Terminate {
                break;
            }

            let now = Local::now();
            if now - last_log_time > log_interval {
                let moves = self.stats.dispatched - last_dispatched;
                info!(
                    "Control loop stats: {} moves in last {} seconds ({} ticks, {} failed total)",
                    moves,
                    log_interval.num_seconds(),
                    self.stats.ticks,
                    self.stats.failed_commands
                );
                last_dispatched = self.stats.dispatched;
                last_log_time = now;
            }

            tokio::time::sleep(self.settings.tick_interval).await;
        }

        debug!("Control loop left after {} ticks", self.stats.ticks);
        self.transition()
    }
}

impl ControlLoop<Terminating> {
    /// Releases the stage: stops polling and disconnects the controllers
    pub fn finish(self) -> LoopOutcome {
        let mut stats = self.stats;
        stats.finished_at = Some(Local::now());
        info!(
            "Control loop finished: {} ticks, {} moves, {} failed",
            stats.ticks, stats.dispatched, stats.failed_commands
        );
        LoopOutcome {
            stats,
            shutdown: self.stage.shutdown(),
        }
    }
}
