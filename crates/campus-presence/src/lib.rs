//! Multiplayer presence synchronization for the campus viewer.
//!
//! Each visitor owns exactly one presence row in a shared store. This crate
//! provides the row model, the abstract store contract, an in-process
//! reference store, the presence client that manages one participant's
//! lifecycle, and the stale-presence reaper that bounds the lifetime of
//! ghost entries left behind by crashed or closed clients.

mod client;
mod memory;
mod presence;
mod reaper;
mod store;

pub use client::{ConnectionState, ConnectionStateWatch, PresenceClient};
pub use memory::MemoryStore;
pub use presence::{
    LIVENESS_WINDOW, PlayerPresence, SPAWN_POSITION, SPAWN_YAW, UserId, normalize_nickname,
    now_ms, quantize_position, quantize_yaw, random_color, wrap_yaw,
};
pub use reaper::{ReaperConfig, prune};
pub use store::{PresenceEvent, PresenceStore, StoreError};
