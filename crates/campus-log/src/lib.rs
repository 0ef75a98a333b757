//! Console logging for the campus viewer.
//!
//! A single `tracing` fmt layer with uptime timestamps and module
//! targets. Filtering resolves in order: `RUST_LOG`, then the config's
//! `debug.log_level`, then `info`.

use campus_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directives to use when `RUST_LOG` is unset.
fn filter_directives(config: &Config) -> String {
    if config.debug.log_level.is_empty() {
        "info".to_string()
    } else {
        config.debug.log_level.clone()
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
