//! One teleoperation session: bring the stage up, run the control loop,
//! tear everything down.
//!
//! The shutdown sequence runs exactly once per session. On a startup failure
//! the failing transition already ran it and hands the report back inside the
//! [`StartupFailure`]; otherwise the loop runs it when it finishes.

use crate::config::StageConfig;
use crate::controller::InputDevice;
use crate::hardware::MotionControllerService;
use crate::stage::{Connected, ShutdownReport, Stage, StartupFailure};
use crate::teleop::{ControlLoop, LoopStats};
use chrono::{DateTime, Local};
use tracing::{info, warn};

#[derive(Debug)]
pub struct SessionReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub stats: LoopStats,
    pub shutdown: ShutdownReport,
}

impl SessionReport {
    pub fn log(&self) {
        let duration = self.finished_at - self.started_at;
        info!(
            "Session {} - {} ({}s): {} ticks, {} moves, {} failed",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.finished_at.format("%H:%M:%S"),
            duration.num_seconds(),
            self.stats.ticks,
            self.stats.dispatched,
            self.stats.failed_commands
        );
        if self.shutdown.is_clean() {
            info!(
                "Shutdown clean: {} channels stopped, {} controllers disconnected",
                self.shutdown.channels_stopped, self.shutdown.controllers_disconnected
            );
        } else {
            for error in &self.shutdown.errors {
                warn!("Shutdown error: {}", error);
            }
        }
    }
}

pub async fn run(
    service: &mut dyn MotionControllerService,
    input: Box<dyn InputDevice>,
    config: &StageConfig,
) -> Result<SessionReport, StartupFailure> {
    let started_at = Local::now();
    info!("Starting stage session");

    let stage: Stage<Connected> = Stage::connect(service, &config.controllers).await?;
    let stage = stage.initialize(&config.stage_model).await?;
    let stage = stage.home_all().await?;

    let outcome = ControlLoop::create(stage, input, config.mapping.clone(), config.loop_settings())
        .start()
        .run_until_terminate()
        .await
        .finish();

    let report = SessionReport {
        started_at,
        finished_at: Local::now(),
        stats: outcome.stats,
        shutdown: outcome.shutdown,
    };
    report.log();
    Ok(report)
}
