//! Remote avatar motion for the campus viewer.
//!
//! Turns the sparse, jittery pose samples a [`campus_presence`] client
//! receives into smooth per-frame motion: exponential position smoothing
//! with warp detection, facing derived from observed movement, a registry
//! that tracks one interpolator per remote player, and the rate gate that
//! caps local pose publishing at 20 Hz.

mod interpolate;
mod registry;
mod sampler;

pub use interpolate::{
    LERP_SPEED, MAX_LERP_FACTOR, MOVEMENT_THRESHOLD, Pose, ROTATION_SPEED, RemoteMotion,
    WARP_THRESHOLD,
};
pub use registry::MotionRegistry;
pub use sampler::{PoseSampler, PublishGate};
