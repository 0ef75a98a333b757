//! Stale-presence reaping: client-local eviction of remote players whose
//! rows fell out of the liveness window.
//!
//! Clients that crash or close their tab never delete their row. Each
//! connected client therefore periodically fetches the authoritative
//! "still alive" set from the store and prunes anything it still caches
//! that is absent from it. The authoritative deletion of very old rows is
//! backend housekeeping ([`crate::PresenceStore::purge_stale`]), triggered
//! opportunistically on connect; both removals are idempotent, so racing
//! is harmless.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use campus_config::NetworkConfig;

use crate::presence::{PlayerPresence, UserId};

/// Timing for the stale-presence reaper.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// How often the reaper runs. Default: 10 s.
    pub interval: Duration,
    /// Rows older than this are considered abandoned. Default: 60 s.
    pub liveness_window: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            liveness_window: Duration::from_secs(60),
        }
    }
}

impl ReaperConfig {
    /// Build from the network section of the viewer config.
    pub fn from_network(network: &NetworkConfig) -> Self {
        Self {
            interval: Duration::from_secs(network.reaper_interval_secs),
            liveness_window: Duration::from_secs(network.liveness_window_secs),
        }
    }
}

/// Remove every cached remote player whose id is absent from `live`.
///
/// The local player's id is never pruned. Returns the number of entries
/// removed.
pub fn prune(
    cache: &mut HashMap<UserId, PlayerPresence>,
    live: &HashSet<UserId>,
    local: &UserId,
) -> usize {
    let before = cache.len();
    cache.retain(|id, _| id == local || live.contains(id));
    before - cache.len()
}
