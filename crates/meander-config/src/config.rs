//! Configuration sections with their defaults, and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub world: WorldConfig,
    /// Biome window radii and blending.
    pub window: WindowSettings,
    /// Path layout sampling.
    pub layout: LayoutSettings,
    /// Incremental population budget.
    pub populate: PopulateSettings,
    /// Headless demo run.
    pub demo: DemoConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed every biome and layout draw derives from.
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowSettings {
    pub window_radius: f64,
    pub prune_radius: f64,
    pub transition_width: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    /// Arc-length step between centerline samples.
    pub sample_step: f64,
    /// Clearance between the boat path and the bank.
    pub margin: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PopulateSettings {
    pub entries_per_step: usize,
}

/// Camera run for the headless demo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    pub start_z: f64,
    /// Total distance travelled; negative values travel toward `-z`.
    pub travel_distance: f64,
    /// Camera speed in units per second.
    pub speed: f64,
    /// Simulated frame duration in seconds.
    pub frame_dt: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level used when `RUST_LOG` is unset (e.g. "debug", "info", "warn").
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self { seed: 0x5EED }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            window_radius: 2000.0,
            prune_radius: 2500.0,
            transition_width: 50.0,
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            sample_step: 10.0,
            margin: 5.0,
        }
    }
}

impl Default for PopulateSettings {
    fn default() -> Self {
        Self {
            entries_per_step: 64,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            start_z: 0.0,
            travel_distance: 12_000.0,
            speed: 60.0,
            frame_dt: 1.0 / 60.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for this application, or the working directory
/// when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("meander"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Loads `config.ron` from `config_dir`, writing the defaults there first
    /// if it does not exist.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        if path.exists() {
            let config = Self::read(&path)?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Writes the config to `config_dir/config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let path = config_dir.join(CONFIG_FILE);
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&path, serialized).map_err(|source| ConfigError::WriteError { path, source })
    }

    /// Re-reads the file; `Some` only when it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let fresh = Self::read(&config_dir.join(CONFIG_FILE))?;
        if &fresh != self {
            log::info!("Config reloaded with changes");
            Ok(Some(fresh))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}
