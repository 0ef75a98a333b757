//! In-process reference implementation of [`PresenceStore`].
//!
//! Backs the test suite and the demo binary: all connected clients share
//! one `MemoryStore` and observe each other's writes through its fan-out
//! push channel, standing in for the real durable pub-sub backend.
//!
//! Events are emitted while the table lock is held, so each subscriber
//! sees changes for a given key in write order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use glam::Vec3;
use tokio::sync::{RwLock, mpsc};

use crate::presence::{PlayerPresence, UserId};
use crate::store::{PresenceEvent, PresenceStore, StoreError};

#[derive(Default)]
struct MemoryInner {
    rows: HashMap<UserId, PlayerPresence>,
    subscribers: Vec<mpsc::UnboundedSender<PresenceEvent>>,
}

impl MemoryInner {
    /// Fan an event out to all live subscribers, dropping closed ones.
    fn publish(&mut self, event: PresenceEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Shared in-memory presence store.
///
/// Identity issuance is a monotonic counter formatted as an opaque id.
/// The `fail_*` toggles let tests exercise the client's error paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
    next_id: AtomicU64,
    fail_auth: AtomicBool,
    fail_writes: AtomicBool,
    fail_subscribe: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `authenticate` calls fail.
    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent row writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `subscribe` calls fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::Relaxed);
    }

    /// Number of rows currently stored.
    pub async fn row_count(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    /// Copy of the row for `user`, if present.
    pub async fn row(&self, user: &UserId) -> Option<PlayerPresence> {
        self.inner.read().await.rows.get(user).cloned()
    }

    /// Number of open push subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.write().await;
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Backend("write rejected".to_string()));
        }
        Ok(())
    }
}

impl PresenceStore for MemoryStore {
    async fn authenticate(&self) -> Result<UserId, StoreError> {
        if self.fail_auth.load(Ordering::Relaxed) {
            return Err(StoreError::Auth("anonymous sign-in rejected".to_string()));
        }
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(UserId(format!("anon-{n:04}")))
    }

    async fn insert(&self, row: PlayerPresence) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.write().await;
        inner.rows.insert(row.user_id.clone(), row.clone());
        inner.publish(PresenceEvent::Joined(row));
        Ok(())
    }

    async fn delete(&self, user: &UserId) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.write().await;
        if inner.rows.remove(user).is_some() {
            inner.publish(PresenceEvent::Left(user.clone()));
        }
        Ok(())
    }

    async fn update_pose(
        &self,
        user: &UserId,
        position: Vec3,
        yaw: f32,
        updated_at_ms: u64,
    ) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.write().await;
        let Some(row) = inner.rows.get_mut(user) else {
            return Ok(());
        };
        row.position = position;
        row.yaw = yaw;
        row.updated_at_ms = updated_at_ms;
        let row = row.clone();
        inner.publish(PresenceEvent::Updated(row));
        Ok(())
    }

    async fn update_nickname(
        &self,
        user: &UserId,
        nickname: &str,
        updated_at_ms: u64,
    ) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut inner = self.inner.write().await;
        let Some(row) = inner.rows.get_mut(user) else {
            return Ok(());
        };
        row.nickname = nickname.to_string();
        row.updated_at_ms = updated_at_ms;
        let row = row.clone();
        inner.publish(PresenceEvent::Updated(row));
        Ok(())
    }

    async fn fetch_active(&self, since_ms: u64) -> Result<Vec<PlayerPresence>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .filter(|row| row.updated_at_ms >= since_ms)
            .cloned()
            .collect())
    }

    async fn purge_stale(&self, older_than_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stale: Vec<UserId> = inner
            .rows
            .values()
            .filter(|row| row.updated_at_ms < older_than_ms)
            .map(|row| row.user_id.clone())
            .collect();
        for user in stale {
            inner.rows.remove(&user);
            inner.publish(PresenceEvent::Left(user));
        }
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<PresenceEvent>, StoreError> {
        if self.fail_subscribe.load(Ordering::Relaxed) {
            return Err(StoreError::Backend("subscribe rejected".to_string()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.subscribers.push(tx);
        Ok(rx)
    }
}
