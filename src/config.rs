use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::EngineConfig;
use crate::error::HealthError;
use crate::logging::LogConfig;
use crate::simulator::{MetricSimulator, SimulationConfig};
use crate::status::DEFAULT_SENSITIVITY;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Engine switches and scheduling
    pub engine: EngineSettings,

    /// Simulated telemetry tuning
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Run simulated telemetry on every tick
    pub simulation_enabled: bool,

    /// Classification sensitivity (0-100)
    pub sensitivity: f64,

    /// Seconds between scheduled ticks
    pub tick_interval_secs: u64,

    /// Seed for the simulator; entropy when unset
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            engine: EngineSettings::default(),
            simulation: SimulationConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            simulation_enabled: true,
            sensitivity: DEFAULT_SENSITIVITY,
            tick_interval_secs: 15,
            seed: None,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or defaults when no file exists there yet.
    /// A file that exists but fails to parse or validate is still an error.
    pub fn load_if_exists<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "No config file yet, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".squadhealth")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(
                    path = %config_path.display(),
                    "Using default configuration: {e:#}"
                );
                Self::default()
            }
        }
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> std::result::Result<(), HealthError> {
        let sim = &self.simulation;

        if !(0.0..=1.0).contains(&sim.selection_probability) {
            return Err(HealthError::Configuration(format!(
                "selection_probability must be between 0 and 1, got {}",
                sim.selection_probability
            )));
        }

        let spans = [
            ("training_load_span", sim.training_load_span),
            ("sleep_quality_span", sim.sleep_quality_span),
            ("fatigue_level_span", sim.fatigue_level_span),
            ("heart_rate_variability_span", sim.heart_rate_variability_span),
        ];
        if let Some((name, value)) = spans
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(HealthError::Configuration(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }

        if self.engine.tick_interval_secs == 0 {
            return Err(HealthError::Configuration(
                "tick_interval_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Engine switches; sensitivity is clamped
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.engine.simulation_enabled, self.engine.sensitivity)
    }

    pub fn simulator(&self) -> MetricSimulator {
        MetricSimulator::with_config(self.simulation.clone())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.engine.tick_interval_secs)
    }
}
