//! One interpolator per remote player, kept in sync with the roster.
//!
//! The presence client re-publishes the remote-player list on every cache
//! change; the renderer hands each snapshot to [`MotionRegistry::sync`]
//! and then advances all interpolators once per frame.

use std::collections::HashMap;

use campus_presence::{PlayerPresence, UserId};
use tracing::debug;

use crate::interpolate::{Pose, RemoteMotion};

/// Tracks a [`RemoteMotion`] for every player in the roster.
#[derive(Default)]
pub struct MotionRegistry {
    motions: HashMap<UserId, RemoteMotion>,
}

impl MotionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile against a roster snapshot.
    ///
    /// New players start at their row's pose (rendered == target, no
    /// snap-in), known players are retargeted, and players absent from
    /// the snapshot are dropped along with their state.
    pub fn sync(&mut self, roster: &[PlayerPresence]) {
        for row in roster {
            match self.motions.get_mut(&row.user_id) {
                Some(motion) => motion.set_target(row.position),
                None => {
                    debug!(user = %row.user_id, "tracking new remote player");
                    self.motions
                        .insert(row.user_id.clone(), RemoteMotion::new(row.position, row.yaw));
                }
            }
        }
        self.motions
            .retain(|id, _| roster.iter().any(|row| row.user_id == *id));
    }

    /// Advance every interpolator one frame, yielding the poses to draw.
    pub fn advance_all(&mut self, dt: f32) -> Vec<(UserId, Pose)> {
        self.motions
            .iter_mut()
            .map(|(id, motion)| (id.clone(), motion.advance(dt)))
            .collect()
    }

    /// Number of tracked remote players.
    pub fn len(&self) -> usize {
        self.motions.len()
    }

    /// `true` when no remote player is tracked.
    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Motion state for one player, if tracked.
    pub fn get(&self, user: &UserId) -> Option<&RemoteMotion> {
        self.motions.get(user)
    }
}
