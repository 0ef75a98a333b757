//! Command-line argument parsing for the campus viewer binaries.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Campus viewer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "campus-walk", about = "Campus viewer presence tools")]
pub struct CliArgs {
    /// Display nickname for the local player.
    #[arg(long)]
    pub nickname: Option<String>,

    /// Minimum pose publish interval in milliseconds.
    #[arg(long)]
    pub publish_interval_ms: Option<u64>,

    /// Liveness window in seconds.
    #[arg(long)]
    pub liveness_window_secs: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of simulated walkers to run (demo binary only).
    #[arg(long)]
    pub walkers: Option<u32>,

    /// How long the demo simulation runs, in seconds (demo binary only).
    #[arg(long)]
    pub duration_secs: Option<u64>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(nickname) = &args.nickname {
            self.player.nickname = nickname.clone();
        }
        if let Some(publish_interval_ms) = args.publish_interval_ms {
            self.network.publish_interval_ms = publish_interval_ms;
        }
        if let Some(liveness_window_secs) = args.liveness_window_secs {
            self.network.liveness_window_secs = liveness_window_secs;
        }
        if let Some(log_level) = &args.log_level {
            self.debug.log_level = log_level.clone();
        }
    }
}
