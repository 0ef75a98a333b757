//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Presence network settings.
    pub network: NetworkConfig,
    /// Local player settings.
    pub player: PlayerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Presence network configuration.
///
/// These control how the local pose is published and how aggressively
/// abandoned remote players are evicted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Minimum interval between pose publishes in milliseconds (20 Hz cap).
    pub publish_interval_ms: u64,
    /// A presence row older than this is considered abandoned.
    pub liveness_window_secs: u64,
    /// How often the stale-presence reaper runs.
    pub reaper_interval_secs: u64,
    /// Remote position jumps larger than this snap instead of interpolating.
    pub warp_threshold: f32,
}

/// Local player configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Display name shown above the avatar (1-20 characters).
    pub nickname: String,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter override (empty = use the built-in default).
    pub log_level: String,
}

// --- Default implementations ---

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            publish_interval_ms: 50,
            liveness_window_secs: 60,
            reaper_interval_secs: 10,
            warp_threshold: 5.0,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            nickname: "Player".to_string(),
        }
    }
}

/// Platform config directory for the viewer (`~/.config/campus-walk` on
/// Linux), falling back to the current directory when unavailable.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("campus-walk"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Read {
                path: config_path.clone(),
                source: e,
            })?;
            let config: Config = ron::from_str(&contents).map_err(|e| ConfigError::Malformed {
                path: config_path.clone(),
                source: e,
            })?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join("config.ron");

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::Write {
            path: config_path.clone(),
            source: e,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(|e| ConfigError::Serialize {
                path: config_path.clone(),
                source: e,
            })?;

        std::fs::write(&config_path, serialized).map_err(|e| ConfigError::Write {
            path: config_path.clone(),
            source: e,
        })?;
        Ok(())
    }
}
