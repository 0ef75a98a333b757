//! The presence client: one participant's lifecycle in the shared world.
//!
//! `connect()` establishes an anonymous identity, claims a fresh presence
//! row, seeds the remote-player cache from a snapshot, and opens the push
//! subscription. From then on a single spawned cache task owns the cache:
//! subscription events and the reaper tick are applied on its timeline, so
//! no other code ever mutates the remote-player set. Consumers (the
//! renderer) observe the cache through [`watch`] channels: the connection
//! state and the roster, re-published on every change.
//!
//! Nothing here is allowed to panic or propagate errors into the render
//! loop: fire-and-forget writes log at `warn` and are swallowed, and a
//! failed `connect()` always tears back down to a clean disconnected state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec3;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use campus_config::{NetworkConfig, Preferences};

use crate::presence::{
    PlayerPresence, SPAWN_POSITION, SPAWN_YAW, UserId, normalize_nickname, now_ms,
    quantize_position, quantize_yaw, random_color, wrap_yaw,
};
use crate::reaper::{ReaperConfig, prune};
use crate::store::{PresenceEvent, PresenceStore, StoreError};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// `connect()` is in flight.
    Connecting,
    /// Subscription confirmed active; presence row is live.
    Connected,
    /// Not participating (initial state, clean disconnect, or any failure).
    Disconnected,
}

/// Observable connection state backed by a [`watch`] channel.
///
/// Multiple subscribers can observe state transitions without polling.
pub struct ConnectionStateWatch {
    tx: watch::Sender<ConnectionState>,
    rx: watch::Receiver<ConnectionState>,
}

impl Default for ConnectionStateWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStateWatch {
    /// Create a new watch initialized to [`ConnectionState::Disconnected`].
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx, rx }
    }

    /// Set the current connection state, notifying all subscribers.
    pub fn set(&self, state: ConnectionState) {
        let _ = self.tx.send(state);
    }

    /// Return a new subscriber receiver.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.rx.clone()
    }

    /// Return the current state without blocking.
    pub fn current(&self) -> ConnectionState {
        *self.rx.borrow()
    }
}

/// Manages one participant's presence row and the live set of others.
pub struct PresenceClient<S: PresenceStore> {
    store: Arc<S>,
    network: NetworkConfig,
    preferences: Preferences,
    nickname: String,
    /// Anonymous session identity. Survives `disconnect()` so a reconnect
    /// reuses the same session instead of minting a new one.
    session: Option<UserId>,
    /// In-flight guard: `connect()` is a no-op while another attempt runs.
    connecting: bool,
    state: Arc<ConnectionStateWatch>,
    roster_tx: watch::Sender<Vec<PlayerPresence>>,
    roster_rx: watch::Receiver<Vec<PlayerPresence>>,
    /// Shutdown signal for the cache task of the current connection.
    shutdown_tx: Option<watch::Sender<bool>>,
}

impl<S: PresenceStore> PresenceClient<S> {
    /// Create a disconnected client. The nickname is read from the durable
    /// preference store.
    pub fn new(store: Arc<S>, network: NetworkConfig, preferences: Preferences) -> Self {
        let nickname = preferences.nickname();
        let (roster_tx, roster_rx) = watch::channel(Vec::new());
        Self {
            store,
            network,
            preferences,
            nickname,
            session: None,
            connecting: false,
            state: Arc::new(ConnectionStateWatch::new()),
            roster_tx,
            roster_rx,
            shutdown_tx: None,
        }
    }

    /// The session identity, once acquired.
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref()
    }

    /// The current display name.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Observable connection state.
    pub fn status(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// `true` once the subscription is confirmed active.
    pub fn is_connected(&self) -> bool {
        self.state.current() == ConnectionState::Connected
    }

    /// Observable remote-player list, re-published on every cache change.
    /// Never contains the local player.
    pub fn roster(&self) -> watch::Receiver<Vec<PlayerPresence>> {
        self.roster_rx.clone()
    }

    /// Join the shared world.
    ///
    /// Idempotent: a no-op while already connected or while another attempt
    /// is in flight. On any failure the client is left fully disconnected
    /// (no partial row, no dangling subscription); the caller may simply
    /// call `connect()` again.
    pub async fn connect(&mut self) -> Result<(), StoreError> {
        if self.connecting || self.is_connected() {
            return Ok(());
        }
        self.connecting = true;
        self.state.set(ConnectionState::Connecting);

        let result = self.try_connect().await;
        if let Err(e) = &result {
            warn!("presence connect failed: {e}");
            self.teardown();
            // A row inserted before the failure must not linger until the
            // liveness window evicts it.
            if let Some(user) = &self.session {
                if let Err(e) = self.store.delete(user).await {
                    debug!("post-failure row cleanup failed: {e}");
                }
            }
        }
        self.connecting = false;
        result
    }

    async fn try_connect(&mut self) -> Result<(), StoreError> {
        // Reuse an existing session, otherwise acquire one.
        let user = match &self.session {
            Some(user) => user.clone(),
            None => {
                let user = self.store.authenticate().await?;
                self.session = Some(user.clone());
                user
            }
        };

        // A reconnect after an abrupt disconnect may have left a ghost row
        // for this identity; remove it before inserting the fresh one.
        if let Err(e) = self.store.delete(&user).await {
            debug!("pre-connect row cleanup failed: {e}");
        }

        let row = PlayerPresence {
            user_id: user.clone(),
            position: SPAWN_POSITION,
            yaw: SPAWN_YAW,
            nickname: self.nickname.clone(),
            color: random_color(),
            updated_at_ms: now_ms(),
        };
        self.store.insert(row).await?;

        let reaper = ReaperConfig::from_network(&self.network);
        let liveness_ms = reaper.liveness_window.as_millis() as u64;

        // Opportunistic backend housekeeping; correctness never depends on it.
        if let Err(e) = self
            .store
            .purge_stale(now_ms().saturating_sub(liveness_ms))
            .await
        {
            debug!("stale row purge failed: {e}");
        }

        // Seed the cache from the live snapshot, excluding self.
        let snapshot = self
            .store
            .fetch_active(now_ms().saturating_sub(liveness_ms))
            .await?;
        let cache: HashMap<UserId, PlayerPresence> = snapshot
            .into_iter()
            .filter(|row| row.user_id != user)
            .map(|row| (row.user_id.clone(), row))
            .collect();

        // An Ok return from subscribe() means the subscription is active.
        let events = self.store.subscribe().await?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(cache_task(
            Arc::clone(&self.store),
            user,
            cache,
            events,
            self.roster_tx.clone(),
            Arc::clone(&self.state),
            reaper,
            shutdown_rx,
        ));
        self.shutdown_tx = Some(shutdown_tx);
        self.state.set(ConnectionState::Connected);
        Ok(())
    }

    /// Fire-and-forget publish of the local pose.
    ///
    /// Silently no-ops without a session. The yaw is wrapped into
    /// (-π, π] before quantization, so callers may pass an accumulated
    /// unwrapped angle. Performs no throttling: the caller (the pose
    /// sampler) owns the 20 Hz publish cap. Write errors are logged and
    /// swallowed; nothing propagates to the render loop.
    pub fn publish_pose(&self, position: Vec3, yaw: f32) {
        let Some(user) = self.session.clone() else {
            return;
        };
        let position = quantize_position(position);
        let yaw = quantize_yaw(wrap_yaw(yaw));
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.update_pose(&user, position, yaw, now_ms()).await {
                warn!("pose publish failed: {e}");
            }
        });
    }

    /// Leave the shared world.
    ///
    /// Stops the cache task (and with it the reaper), deletes the own
    /// presence row, and clears the roster. Safe to call repeatedly and
    /// during teardown; a later `connect()` will not double-subscribe.
    pub async fn disconnect(&mut self) {
        self.teardown();
        if let Some(user) = &self.session {
            if let Err(e) = self.store.delete(user).await {
                debug!("presence row delete on disconnect failed: {e}");
            }
        }
    }

    /// Change the display name.
    ///
    /// Normalizes the name, persists it to the durable preference store,
    /// and, when a session exists, writes it into the presence row with
    /// a fresh timestamp so subscribers observe the rename as a live
    /// update rather than a silent field mutation.
    pub async fn update_nickname(&mut self, name: &str) {
        let nickname = normalize_nickname(name);
        self.nickname = nickname.clone();
        if let Err(e) = self.preferences.save_nickname(&nickname) {
            warn!("failed to persist nickname: {e}");
        }
        if let Some(user) = &self.session {
            if let Err(e) = self
                .store
                .update_nickname(user, &nickname, now_ms())
                .await
            {
                warn!("nickname update failed: {e}");
            }
        }
    }

    /// Drop the current connection's tasks and local state. The session
    /// identity is kept for reuse by the next `connect()`.
    fn teardown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
        self.state.set(ConnectionState::Disconnected);
        let _ = self.roster_tx.send(Vec::new());
    }
}

/// Apply one push event to the cache. Returns `true` if the cache changed.
///
/// Self-rows are filtered here, and a row older than the cached one for
/// the same key is discarded: the `updated_at` stamp guards against
/// out-of-order delivery overwriting newer state.
fn apply_event(
    cache: &mut HashMap<UserId, PlayerPresence>,
    local: &UserId,
    event: PresenceEvent,
) -> bool {
    match event {
        PresenceEvent::Joined(row) | PresenceEvent::Updated(row) => {
            if row.user_id == *local {
                return false;
            }
            if let Some(cached) = cache.get(&row.user_id) {
                if row.updated_at_ms < cached.updated_at_ms {
                    debug!(user = %row.user_id, "discarding stale presence event");
                    return false;
                }
            }
            cache.insert(row.user_id.clone(), row);
            true
        }
        PresenceEvent::Left(user) => cache.remove(&user).is_some(),
    }
}

/// Derive the published roster from the cache: stable order, self excluded
/// (self never enters the cache in the first place).
fn roster_of(cache: &HashMap<UserId, PlayerPresence>) -> Vec<PlayerPresence> {
    let mut roster: Vec<PlayerPresence> = cache.values().cloned().collect();
    roster.sort_by(|a, b| a.user_id.0.cmp(&b.user_id.0));
    roster
}

/// The single serialized mutation point for the remote-player cache.
///
/// Owns the cache for one connection's lifetime and selects over the
/// subscription stream, the reaper interval, and the shutdown signal.
/// Every mutation re-publishes the roster.
#[allow(clippy::too_many_arguments)]
async fn cache_task<S: PresenceStore>(
    store: Arc<S>,
    local: UserId,
    mut cache: HashMap<UserId, PlayerPresence>,
    mut events: mpsc::UnboundedReceiver<PresenceEvent>,
    roster_tx: watch::Sender<Vec<PlayerPresence>>,
    state: Arc<ConnectionStateWatch>,
    reaper: ReaperConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // First tick one full interval out, matching the original fixed timer.
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + reaper.interval,
        reaper.interval,
    );
    let liveness_ms = reaper.liveness_window.as_millis() as u64;

    // Publish the seeded snapshot.
    let _ = roster_tx.send(roster_of(&cache));

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        if apply_event(&mut cache, &local, event) {
                            let _ = roster_tx.send(roster_of(&cache));
                        }
                    }
                    None => {
                        // Push channel gone: treat as a lost connection.
                        state.set(ConnectionState::Disconnected);
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                match store.fetch_active(now_ms().saturating_sub(liveness_ms)).await {
                    Ok(rows) => {
                        let live: HashSet<UserId> =
                            rows.into_iter().map(|row| row.user_id).collect();
                        if prune(&mut cache, &live, &local) > 0 {
                            let _ = roster_tx.send(roster_of(&cache));
                        }
                    }
                    Err(e) => warn!("reaper fetch failed, skipping tick: {e}"),
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
