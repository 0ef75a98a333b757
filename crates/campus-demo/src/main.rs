//! Headless presence demo: simulated visitors sharing one in-memory store.
//!
//! Stands in for the 3D viewer: an observer client renders the roster as
//! log lines while walker clients publish rate-gated poses, exercising the
//! full connect / publish / interpolate / disconnect path.
//!
//! Run with `cargo run -p campus-demo` and watch the roster converge.
//! Run with `cargo run -p campus-demo -- --walkers 5 --duration-secs 30`
//! for a busier plaza.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec3;
use tracing::{error, info};

use campus_config::{CliArgs, Config, Preferences, default_config_dir};
use campus_log::init_logging;
use campus_motion::{MotionRegistry, PoseSampler};
use campus_presence::{MemoryStore, PresenceClient, SPAWN_POSITION};

/// Radius of the circuit the walkers follow, in world units.
const CIRCUIT_RADIUS: f32 = 20.0;

/// One simulated visitor walking a circuit around the spawn plaza.
struct Walker {
    client: PresenceClient<MemoryStore>,
    sampler: PoseSampler,
    /// Position on the circuit, in radians.
    angle: f32,
    /// Angular speed, radians per second.
    speed: f32,
}

impl Walker {
    fn pose(&self) -> (Vec3, f32) {
        let position = SPAWN_POSITION
            + Vec3::new(
                CIRCUIT_RADIUS * self.angle.cos(),
                0.0,
                CIRCUIT_RADIUS * self.angle.sin(),
            );
        // Facing tangent to the circuit.
        let yaw = self.angle + std::f32::consts::FRAC_PI_2;
        (position, yaw)
    }
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = Config::load_or_create(&config_dir).unwrap_or_default();
    config.apply_cli_overrides(&args);
    init_logging(&config);

    let walker_count = args.walkers.unwrap_or(2).max(1);
    let duration = Duration::from_secs(args.duration_secs.unwrap_or(10));
    let publish_interval = Duration::from_millis(config.network.publish_interval_ms);

    let store = Arc::new(MemoryStore::new());

    // The observer plays the local viewer: it publishes nothing and
    // renders the roster headlessly through a motion registry.
    let mut observer = PresenceClient::new(
        Arc::clone(&store),
        config.network.clone(),
        Preferences::new(&config_dir),
    );
    if let Err(e) = observer.connect().await {
        error!("observer failed to connect: {e}");
        return;
    }
    info!(user = %observer.user_id().unwrap(), "observer connected");

    let mut walkers = Vec::new();
    for i in 0..walker_count {
        let mut client = PresenceClient::new(
            Arc::clone(&store),
            config.network.clone(),
            Preferences::new(&config_dir.join(format!("walker-{i}"))),
        );
        client.update_nickname(&format!("Walker {i}")).await;
        if let Err(e) = client.connect().await {
            error!("walker {i} failed to connect: {e}");
            continue;
        }
        walkers.push(Walker {
            client,
            sampler: PoseSampler::new(publish_interval),
            angle: i as f32 * std::f32::consts::TAU / walker_count as f32,
            speed: 0.4 + 0.1 * i as f32,
        });
    }
    info!(walkers = walkers.len(), "plaza populated");

    let mut registry = MotionRegistry::new();
    let frame = Duration::from_millis(16);
    let dt = frame.as_secs_f32();
    let started = Instant::now();
    let mut last_report = started;

    while started.elapsed() < duration {
        // Walkers move along their circuits; the gate caps each one at 20 Hz
        // no matter how fast this loop runs.
        let now = Instant::now();
        for walker in &mut walkers {
            walker.angle += walker.speed * dt;
            let (position, yaw) = walker.pose();
            if let Some((position, yaw)) = walker.sampler.sample(now, position, yaw) {
                walker.client.publish_pose(position, yaw);
            }
        }

        // The observer's frame: reconcile the roster, then advance every
        // interpolator exactly once.
        let roster = observer.roster().borrow().clone();
        registry.sync(&roster);
        let poses = registry.advance_all(dt);

        if now.duration_since(last_report) >= Duration::from_secs(1) {
            last_report = now;
            for (user, pose) in &poses {
                let nickname = roster
                    .iter()
                    .find(|row| row.user_id == *user)
                    .map(|row| row.nickname.as_str())
                    .unwrap_or("?");
                info!(
                    user = %user,
                    nickname,
                    x = pose.position.x,
                    z = pose.position.z,
                    yaw = pose.yaw,
                    "rendered avatar"
                );
            }
        }

        tokio::time::sleep(frame).await;
    }

    for walker in &mut walkers {
        walker.client.disconnect().await;
    }
    observer.disconnect().await;
    info!("demo finished");
}
