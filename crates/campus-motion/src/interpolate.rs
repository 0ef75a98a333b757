//! Per-player motion smoothing.
//!
//! Authoritative samples arrive at an unpredictable rate (publish cap,
//! network latency, jitter); rendering runs at 60+ Hz. Each remote player
//! gets a [`RemoteMotion`] that lerps the rendered position toward the
//! latest sample every frame and derives facing from the observed
//! displacement rather than trusting the transmitted yaw, so a client that
//! sends stale or default yaw still walks facing the way it moves.

use glam::Vec3;

use campus_presence::wrap_yaw;

/// Position jumps beyond this snap instead of sliding (teleport, respawn,
/// reconnect), in world units.
pub const WARP_THRESHOLD: f32 = 5.0;

/// Exponential smoothing rate for position, per second.
pub const LERP_SPEED: f32 = 8.0;

/// Cap on the per-frame interpolation fraction. Keeps a long frame-time
/// spike from jumping most of the remaining distance at once.
pub const MAX_LERP_FACTOR: f32 = 0.15;

/// Displacement below this holds the facing steady, preventing
/// jitter-driven spinning while a remote player idles.
pub const MOVEMENT_THRESHOLD: f32 = 0.01;

/// Angular turn rate toward the movement direction, per second.
pub const ROTATION_SPEED: f32 = 10.0;

/// A rendered pose: position plus facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// World position.
    pub position: Vec3,
    /// Facing angle in radians, normalized to (-π, π].
    pub yaw: f32,
}

/// Smoothing state for one remote player.
pub struct RemoteMotion {
    /// Latest authoritative position.
    target: Vec3,
    /// Position actually drawn, lagging `target`.
    rendered: Vec3,
    /// Previous frame's rendered position, for deriving movement direction.
    previous_rendered: Vec3,
    /// Facing actually drawn. Derived from motion, not from samples.
    rendered_yaw: f32,
}

impl RemoteMotion {
    /// Start tracking at the first received sample. Rendered and target
    /// poses coincide, so the avatar appears in place with no visible
    /// snap-in.
    pub fn new(position: Vec3, yaw: f32) -> Self {
        Self {
            target: position,
            rendered: position,
            previous_rendered: position,
            rendered_yaw: wrap_yaw(yaw),
        }
    }

    /// Accept a new authoritative sample.
    ///
    /// A jump beyond [`WARP_THRESHOLD`] snaps the rendered position to the
    /// sample so a teleport never turns into a long-distance slide;
    /// otherwise only the target moves and [`advance`](Self::advance)
    /// smooths toward it.
    pub fn set_target(&mut self, position: Vec3) {
        if self.rendered.distance(position) > WARP_THRESHOLD {
            self.rendered = position;
        }
        self.target = position;
    }

    /// Advance one render frame by `dt` seconds, returning the pose to draw.
    pub fn advance(&mut self, dt: f32) -> Pose {
        self.previous_rendered = self.rendered;

        let factor = (dt * LERP_SPEED).min(MAX_LERP_FACTOR);
        self.rendered = self.rendered.lerp(self.target, factor);

        let displacement = self.rendered - self.previous_rendered;
        if displacement.length() > MOVEMENT_THRESHOLD {
            let target_yaw = displacement.x.atan2(displacement.z);
            let diff = wrap_yaw(target_yaw - self.rendered_yaw);
            // Clamp the turn fraction so a frame-time spike cannot
            // overshoot past the target direction.
            let turn = (dt * ROTATION_SPEED).min(1.0);
            self.rendered_yaw = wrap_yaw(self.rendered_yaw + diff * turn);
        }

        Pose {
            position: self.rendered,
            yaw: self.rendered_yaw,
        }
    }

    /// The position currently drawn.
    pub fn rendered(&self) -> Vec3 {
        self.rendered
    }

    /// The latest authoritative position.
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// The facing currently drawn.
    pub fn rendered_yaw(&self) -> f32 {
        self.rendered_yaw
    }
}
