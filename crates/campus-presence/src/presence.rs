//! The presence row model: one record per connected participant.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A presence row not updated within this window is considered abandoned
/// and must not be rendered as an active player.
pub const LIVENESS_WINDOW: Duration = Duration::from_secs(60);

/// Where a freshly connected player appears, in world units.
pub const SPAWN_POSITION: Vec3 = Vec3::new(100.0, 2.0, -100.0);

/// Initial facing for a freshly connected player.
pub const SPAWN_YAW: f32 = 0.0;

/// Maximum nickname length in characters.
pub const MAX_NICKNAME_LEN: usize = 20;

/// Opaque stable identifier for one participant's session.
///
/// Issued by the store's anonymous identity service; reused across
/// reconnects within the same session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One participant's current pose and metadata in the shared store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPresence {
    /// Unique session key.
    pub user_id: UserId,
    /// World position.
    pub position: Vec3,
    /// Facing angle in radians, normalized to (-π, π].
    pub yaw: f32,
    /// Display name, 1-20 characters.
    pub nickname: String,
    /// Display color as `#rrggbb`. Cosmetic only, never an identity key.
    pub color: String,
    /// Unix milliseconds of the last write. Monotonically non-decreasing
    /// per `user_id`; determines liveness.
    pub updated_at_ms: u64,
}

/// Current wall-clock time as Unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Round a position to one decimal place per axis before publishing.
///
/// One decimal of a world unit is well below visible avatar motion, and
/// shorter payloads keep backend write volume down.
pub fn quantize_position(position: Vec3) -> Vec3 {
    Vec3::new(
        (position.x * 10.0).round() / 10.0,
        (position.y * 10.0).round() / 10.0,
        (position.z * 10.0).round() / 10.0,
    )
}

/// Round a yaw angle to two decimal places before publishing.
pub fn quantize_yaw(yaw: f32) -> f32 {
    (yaw * 100.0).round() / 100.0
}

/// Normalize an angle into (-π, π], the range stored in a presence row.
pub fn wrap_yaw(yaw: f32) -> f32 {
    use std::f32::consts::PI;
    let mut wrapped = yaw % (2.0 * PI);
    if wrapped > PI {
        wrapped -= 2.0 * PI;
    } else if wrapped <= -PI {
        wrapped += 2.0 * PI;
    }
    wrapped
}

/// Normalize a display name: empty becomes `"Player"`, anything longer
/// than [`MAX_NICKNAME_LEN`] characters is truncated.
pub fn normalize_nickname(name: &str) -> String {
    if name.is_empty() {
        return "Player".to_string();
    }
    name.chars().take(MAX_NICKNAME_LEN).collect()
}

/// Assign a random `#rrggbb` display color for a new session.
///
/// No collision avoidance: two players may share a color.
pub fn random_color() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    format!("#{:06x}", rng.random_range(0..0x100_0000u32))
}
