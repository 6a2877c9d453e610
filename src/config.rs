//! Stage configuration stored as TOML under the user's config directory.

use crate::hardware::simulation::SimulationSettings;
use crate::mapping::AxisMappingTable;
use crate::stage::CONTROLLER_COUNT;
use crate::teleop::{LoopSettings, MIN_TICK_INTERVAL};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/stagecontroller";
const CONFIG_FILE: &str = "stage.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    /// Controller serials; the first drives X/Y/Z, the second Roll/Pitch/Yaw
    pub controllers: [String; CONTROLLER_COUNT],
    /// Settings name prefix, combined with each channel's device id
    pub stage_model: String,
    pub step_size: f64,
    pub command_timeout_ms: u64,
    pub tick_interval_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamepad: Option<usize>,
    pub mapping: AxisMappingTable,
    pub simulation: SimulationSettings,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            controllers: ["70214254".to_string(), "70205184".to_string()],
            stage_model: "MAX683/M".to_string(),
            step_size: 0.01,
            command_timeout_ms: 60_000,
            tick_interval_ms: 100,
            gamepad: None,
            mapping: AxisMappingTable::default_config(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl StageConfig {
    pub fn config_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Writes the default configuration when no file exists yet
    pub async fn ensure_default_config() -> Result<()> {
        let path = Self::config_path();
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| eyre!("Failed to check if config file exists: {}", e))?
        {
            info!("Creating default configuration at {}", path.display());
            Self::default().save_to(&path).await?;
        }
        Ok(())
    }

    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()).await
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(eyre!(
                "Step size must be a finite positive number, got {}",
                self.step_size
            ));
        }
        if self.command_timeout_ms == 0 {
            return Err(eyre!("Command timeout must be non-zero"));
        }
        if self.tick_interval_ms == 0 {
            return Err(eyre!("Tick interval must be non-zero"));
        }
        if self.controllers[0] == self.controllers[1] {
            return Err(eyre!(
                "Both controller slots use serial {}",
                self.controllers[0]
            ));
        }
        self.mapping
            .validate()
            .map_err(|e| eyre!("Invalid mapping table: {}", e))?;
        Ok(())
    }

    /// Loop parameters, with the tick interval raised to its lower bound
    pub fn loop_settings(&self) -> LoopSettings {
        let requested = Duration::from_millis(self.tick_interval_ms);
        let tick_interval = if requested < MIN_TICK_INTERVAL {
            warn!(
                "Tick interval {:?} below {:?}, using the minimum",
                requested, MIN_TICK_INTERVAL
            );
            MIN_TICK_INTERVAL
        } else {
            requested
        };
        LoopSettings {
            step_size: self.step_size,
            command_timeout: Duration::from_millis(self.command_timeout_ms),
            tick_interval,
        }
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
