pub mod config;
pub mod controller;
pub mod hardware;
pub mod mapping;
pub mod session;
pub mod stage;
pub mod teleop;

use crate::config::StageConfig;
use crate::controller::GamepadInput;
use crate::hardware::simulation::SimulatedMotionService;
use color_eyre::{eyre::eyre, Result};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    StageConfig::ensure_default_config().await?;
    let config = StageConfig::load().await?;
    config.validate()?;
    info!(
        "Loaded configuration from {}",
        StageConfig::config_path().display()
    );

    // The gamepad must be present before any hardware is touched
    let input = GamepadInput::open(config.gamepad)
        .map_err(|e| eyre!("Failed to open gamepad: {}", e))?;

    warn!("No hardware transport configured, driving the simulated stage");
    let mut service =
        SimulatedMotionService::new(config.controllers.to_vec(), config.simulation.clone());

    match session::run(&mut service, Box::new(input), &config).await {
        Ok(_report) => {
            info!("Stage session ended");
            Ok(())
        }
        Err(failure) => {
            error!("Stage startup failed: {}", failure.error);
            for e in &failure.shutdown.errors {
                warn!("Shutdown error: {}", e);
            }
            Err(eyre!("Stage startup failed: {}", failure))
        }
    }
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
