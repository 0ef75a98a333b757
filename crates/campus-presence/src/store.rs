//! The abstract presence store contract.
//!
//! The real backend (durable rows plus a realtime push channel) lives
//! outside this repository; everything here is written against this trait.
//! [`crate::MemoryStore`] is the in-process reference implementation used
//! by tests and the demo binary.

use std::future::Future;

use glam::Vec3;
use tokio::sync::mpsc;

use crate::presence::{PlayerPresence, UserId};

/// Errors surfaced by a presence store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Anonymous identity issuance failed. Aborts `connect()` with no
    /// partial row written.
    #[error("identity error: {0}")]
    Auth(String),

    /// A row read or write failed in the backend.
    #[error("backend error: {0}")]
    Backend(String),

    /// The push subscription could not be established or has closed.
    #[error("subscription closed")]
    SubscriptionClosed,
}

/// A change notification from the store's push channel.
///
/// Delivered in send order per `user_id`. Subscribers receive their own
/// writes too; self-filtering is the client's job.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// A row was inserted.
    Joined(PlayerPresence),
    /// An existing row was updated.
    Updated(PlayerPresence),
    /// A row was deleted (explicit disconnect or backend housekeeping).
    Left(UserId),
}

/// Backend contract for presence rows keyed by [`UserId`].
///
/// All operations are `Send` futures so the client can fire-and-forget
/// writes from the render loop without awaiting them in place.
pub trait PresenceStore: Send + Sync + 'static {
    /// Issue (or mint) an anonymous session identity.
    fn authenticate(&self) -> impl Future<Output = Result<UserId, StoreError>> + Send;

    /// Insert a fresh row. The caller deletes any pre-existing row for the
    /// same identity first.
    fn insert(&self, row: PlayerPresence) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the row for `user`. Deleting an absent row is not an error.
    fn delete(&self, user: &UserId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Partial update of position, yaw, and timestamp. A missing row is a
    /// successful no-op (the owner may be mid-reconnect).
    fn update_pose(
        &self,
        user: &UserId,
        position: Vec3,
        yaw: f32,
        updated_at_ms: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Partial update of the nickname. Stamps `updated_at_ms` so
    /// subscribers observe the rename as a live update.
    fn update_nickname(
        &self,
        user: &UserId,
        nickname: &str,
        updated_at_ms: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch all rows with `updated_at_ms >= since_ms`.
    fn fetch_active(
        &self,
        since_ms: u64,
    ) -> impl Future<Output = Result<Vec<PlayerPresence>, StoreError>> + Send;

    /// Server-side housekeeping: purge rows older than the floor.
    /// Best-effort; correctness never depends on it.
    fn purge_stale(
        &self,
        older_than_ms: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Open a push subscription over row change events. An `Ok` return
    /// means the subscription is confirmed active.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<mpsc::UnboundedReceiver<PresenceEvent>, StoreError>> + Send;
}
