//! Configuration system for the campus viewer.
//!
//! Provides runtime-configurable settings that persist to disk as RON files,
//! CLI overrides via clap, and the durable nickname preference (a single key
//! read at startup and written whenever the player renames themselves).

mod cli;
mod config;
mod error;
mod preferences;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, NetworkConfig, PlayerConfig, default_config_dir};
pub use error::ConfigError;
pub use preferences::Preferences;
