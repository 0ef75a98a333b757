//! Rate-gated sampling of the local player's pose.
//!
//! The render loop produces a pose every frame; the backend should see at
//! most one write per 50 ms regardless of frame rate. The gate is a plain
//! last-sent timestamp check so the publish volume is bounded by wall
//! time, not rendering performance.

use std::time::{Duration, Instant};

use glam::Vec3;

/// Last-sent timestamp gate: at most one send per `min_interval`.
#[derive(Debug)]
pub struct PublishGate {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl PublishGate {
    /// Gate allowing one send per `min_interval`. The first call always
    /// passes.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Returns `true` when enough time has passed since the last accepted
    /// send, and records `now` as the new last-sent time.
    pub fn try_send(&mut self, now: Instant) -> bool {
        match self.last_sent {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_sent = Some(now);
                true
            }
        }
    }
}

/// Samples the local pose each frame and decides when to publish.
///
/// The caller feeds the camera pose in every frame; `sample` returns the
/// pose to hand to `PresenceClient::publish_pose` at most once per
/// publish interval.
#[derive(Debug)]
pub struct PoseSampler {
    gate: PublishGate,
}

impl PoseSampler {
    /// Sampler publishing at most once per `publish_interval` (50 ms for
    /// the 20 Hz cap).
    pub fn new(publish_interval: Duration) -> Self {
        Self {
            gate: PublishGate::new(publish_interval),
        }
    }

    /// Offer this frame's local pose. Returns it when it should be
    /// published, `None` while the gate is closed.
    pub fn sample(&mut self, now: Instant, position: Vec3, yaw: f32) -> Option<(Vec3, f32)> {
        if self.gate.try_send(now) {
            Some((position, yaw))
        } else {
            None
        }
    }
}
