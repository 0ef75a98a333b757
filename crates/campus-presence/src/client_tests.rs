//! Unit tests for the presence client lifecycle.

use super::*;
use crate::MemoryStore;
use crate::presence::LIVENESS_WINDOW;
use tempfile::TempDir;

fn test_client(store: &Arc<MemoryStore>) -> (PresenceClient<MemoryStore>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let preferences = Preferences::new(dir.path());
    let client = PresenceClient::new(Arc::clone(store), NetworkConfig::default(), preferences);
    (client, dir)
}

/// Let spawned tasks (cache tasks, fire-and-forget writes) run.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

fn ghost_row(id: &str, updated_at_ms: u64) -> PlayerPresence {
    PlayerPresence {
        user_id: UserId(id.to_string()),
        position: Vec3::new(1.0, 2.0, 3.0),
        yaw: 0.0,
        nickname: "Ghost".to_string(),
        color: "#808080".to_string(),
        updated_at_ms,
    }
}

#[tokio::test]
async fn test_connect_creates_one_row_and_subscription() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);

    client.connect().await.unwrap();
    assert!(client.is_connected());
    assert_eq!(store.row_count().await, 1);
    assert_eq!(store.subscriber_count().await, 1);

    let user = client.user_id().unwrap().clone();
    let row = store.row(&user).await.unwrap();
    assert_eq!(row.position, SPAWN_POSITION);
    assert_eq!(row.yaw, SPAWN_YAW);
    assert!(row.color.starts_with('#'));
}

#[tokio::test]
async fn test_connect_twice_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);

    client.connect().await.unwrap();
    client.connect().await.unwrap();

    assert_eq!(store.row_count().await, 1);
    assert_eq!(store.subscriber_count().await, 1);
}

#[tokio::test]
async fn test_reconnect_does_not_double_subscribe() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);

    client.connect().await.unwrap();
    let first_user = client.user_id().unwrap().clone();
    client.disconnect().await;
    settle().await;

    client.connect().await.unwrap();
    settle().await;

    assert_eq!(store.subscriber_count().await, 1);
    assert_eq!(store.row_count().await, 1);
    // The session identity is reused across the reconnect.
    assert_eq!(client.user_id(), Some(&first_user));
}

#[tokio::test]
async fn test_roster_excludes_self() {
    let store = Arc::new(MemoryStore::new());
    let (mut a, _da) = test_client(&store);
    let (mut b, _db) = test_client(&store);

    a.connect().await.unwrap();
    b.connect().await.unwrap();
    settle().await;

    let a_id = a.user_id().unwrap().clone();
    let b_id = b.user_id().unwrap().clone();

    let a_roster = a.roster().borrow().clone();
    assert_eq!(a_roster.len(), 1);
    assert_eq!(a_roster[0].user_id, b_id);

    a.publish_pose(Vec3::new(5.0, 0.0, 5.0), 1.0);
    settle().await;

    // A's own update never appears in A's roster.
    let a_roster = a.roster().borrow().clone();
    assert!(a_roster.iter().all(|row| row.user_id != a_id));

    let b_roster = b.roster().borrow().clone();
    assert_eq!(b_roster.len(), 1);
    assert_eq!(b_roster[0].user_id, a_id);
    assert_eq!(b_roster[0].position, Vec3::new(5.0, 0.0, 5.0));
}

#[tokio::test]
async fn test_snapshot_seeds_existing_players() {
    let store = Arc::new(MemoryStore::new());
    let (mut a, _da) = test_client(&store);
    let (mut b, _db) = test_client(&store);

    a.connect().await.unwrap();
    b.connect().await.unwrap();
    settle().await;

    // B joined second, so A could only learn about B via the push channel,
    // while B got A from the connect snapshot.
    let b_roster = b.roster().borrow().clone();
    assert_eq!(b_roster.len(), 1);
    assert_eq!(&b_roster[0].user_id, a.user_id().unwrap());
}

#[tokio::test]
async fn test_stale_rows_not_seeded() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(ghost_row("ghost", now_ms().saturating_sub(120_000)))
        .await
        .unwrap();

    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();
    settle().await;

    assert!(client.roster().borrow().is_empty());
    // Connect also triggered backend housekeeping for the abandoned row.
    assert_eq!(store.row_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reaper_evicts_without_delete_event() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();
    settle().await;

    // The ghost arrives through the push channel with a timestamp already
    // outside the liveness window, simulating a client that stopped
    // updating without ever deleting its row.
    let stale_ms = now_ms().saturating_sub(LIVENESS_WINDOW.as_millis() as u64 + 1_000);
    store.insert(ghost_row("ghost", stale_ms)).await.unwrap();
    settle().await;
    assert_eq!(client.roster().borrow().len(), 1);

    // Next reaper tick prunes it; no delete event was ever received.
    tokio::time::advance(std::time::Duration::from_secs(10)).await;
    settle().await;
    assert!(client.roster().borrow().is_empty());
    assert!(client.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_double_removal_is_safe() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();
    settle().await;

    let stale_ms = now_ms().saturating_sub(LIVENESS_WINDOW.as_millis() as u64 + 1_000);
    store.insert(ghost_row("ghost", stale_ms)).await.unwrap();
    settle().await;
    assert_eq!(client.roster().borrow().len(), 1);

    // Backend purge removes the row (Left event prunes the cache), then
    // the reaper tick prunes again. Both removals must be no-op safe.
    store
        .purge_stale(now_ms().saturating_sub(LIVENESS_WINDOW.as_millis() as u64))
        .await
        .unwrap();
    settle().await;
    assert!(client.roster().borrow().is_empty());

    tokio::time::advance(std::time::Duration::from_secs(10)).await;
    settle().await;
    assert!(client.roster().borrow().is_empty());
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_clean_disconnect_removes_immediately() {
    let store = Arc::new(MemoryStore::new());
    let (mut a, _da) = test_client(&store);
    let (mut b, _db) = test_client(&store);

    a.connect().await.unwrap();
    b.connect().await.unwrap();
    settle().await;
    assert_eq!(b.roster().borrow().len(), 1);

    a.disconnect().await;
    settle().await;

    // B sees the delete event, no liveness window involved.
    assert!(b.roster().borrow().is_empty());
    assert!(!a.is_connected());
    assert!(a.roster().borrow().is_empty());
    assert_eq!(store.row_count().await, 1);
}

#[tokio::test]
async fn test_disconnect_twice_is_safe() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);

    client.connect().await.unwrap();
    client.disconnect().await;
    client.disconnect().await;
    assert!(!client.is_connected());

    // Disconnect before ever connecting is also fine.
    let (mut fresh, _dir2) = test_client(&store);
    fresh.disconnect().await;
}

#[tokio::test]
async fn test_auth_failure_leaves_clean_disconnected_state() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_auth(true);
    let (mut client, _dir) = test_client(&store);

    assert!(matches!(client.connect().await, Err(StoreError::Auth(_))));
    assert!(!client.is_connected());
    assert!(client.user_id().is_none());
    assert_eq!(store.row_count().await, 0);

    // Manual retry is always safe once the backend recovers.
    store.set_fail_auth(false);
    client.connect().await.unwrap();
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_insert_failure_leaves_clean_disconnected_state() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_writes(true);
    let (mut client, _dir) = test_client(&store);

    assert!(client.connect().await.is_err());
    assert!(!client.is_connected());
    assert_eq!(store.row_count().await, 0);
    assert_eq!(store.subscriber_count().await, 0);
}

#[tokio::test]
async fn test_subscribe_failure_leaves_no_row() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_subscribe(true);
    let (mut client, _dir) = test_client(&store);

    assert!(client.connect().await.is_err());
    assert!(!client.is_connected());
    // The spawn row inserted before the failed subscription attempt is
    // removed right away instead of lingering until the liveness window
    // evicts it.
    assert_eq!(store.row_count().await, 0);

    store.set_fail_subscribe(false);
    client.connect().await.unwrap();
    assert!(client.is_connected());
    assert_eq!(store.row_count().await, 1);
}

#[tokio::test]
async fn test_publish_pose_quantizes_before_writing() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();

    client.publish_pose(Vec3::new(1.234, 5.678, 9.999), 0.456);
    settle().await;

    let row = store.row(client.user_id().unwrap()).await.unwrap();
    assert_eq!(row.position, Vec3::new(1.2, 5.7, 10.0));
    assert_eq!(row.yaw, 0.46);
}

#[tokio::test]
async fn test_publish_pose_wraps_unwrapped_yaw() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();

    // A caller accumulating yaw over several full turns still stores an
    // angle inside (-π, π]: 7.0 - 2π ≈ 0.7168, quantized to 0.72.
    client.publish_pose(Vec3::ZERO, 7.0);
    settle().await;

    let row = store.row(client.user_id().unwrap()).await.unwrap();
    let pi = std::f32::consts::PI;
    assert!(row.yaw > -pi && row.yaw <= pi);
    assert!((row.yaw - 0.72).abs() < 1e-4);

    client.publish_pose(Vec3::ZERO, -7.0);
    settle().await;
    let row = store.row(client.user_id().unwrap()).await.unwrap();
    assert!((row.yaw + 0.72).abs() < 1e-4);
}

#[tokio::test]
async fn test_publish_pose_without_session_is_noop() {
    let store = Arc::new(MemoryStore::new());
    let (client, _dir) = test_client(&store);

    client.publish_pose(Vec3::ONE, 1.0);
    settle().await;
    assert_eq!(store.row_count().await, 0);
}

#[tokio::test]
async fn test_publish_pose_write_failure_is_swallowed() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();

    store.set_fail_writes(true);
    client.publish_pose(Vec3::new(7.0, 0.0, 7.0), 0.0);
    settle().await;

    // Previous state unchanged, client still connected.
    let row = store.row(client.user_id().unwrap()).await.unwrap();
    assert_eq!(row.position, SPAWN_POSITION);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_stale_event_is_discarded() {
    let store = Arc::new(MemoryStore::new());
    let (mut a, _da) = test_client(&store);
    let (mut b, _db) = test_client(&store);
    a.connect().await.unwrap();
    b.connect().await.unwrap();
    settle().await;

    let a_id = a.user_id().unwrap().clone();
    let t = now_ms();
    store
        .update_pose(&a_id, Vec3::new(10.0, 0.0, 10.0), 0.0, t + 1_000)
        .await
        .unwrap();
    // An older sample arriving late must not overwrite the newer one.
    store
        .update_pose(&a_id, Vec3::new(0.0, 0.0, 0.0), 0.0, t + 500)
        .await
        .unwrap();
    settle().await;

    let roster = b.roster().borrow().clone();
    assert_eq!(roster[0].position, Vec3::new(10.0, 0.0, 10.0));
    assert_eq!(roster[0].updated_at_ms, t + 1_000);
}

#[tokio::test]
async fn test_nickname_persists_and_propagates() {
    let store = Arc::new(MemoryStore::new());
    let (mut a, dir) = test_client(&store);
    let (mut b, _db) = test_client(&store);
    a.connect().await.unwrap();
    b.connect().await.unwrap();
    settle().await;

    let before = store.row(a.user_id().unwrap()).await.unwrap().updated_at_ms;
    a.update_nickname("Campus Guide").await;
    settle().await;

    // Durable preference written.
    assert_eq!(Preferences::new(dir.path()).nickname(), "Campus Guide");

    // Subscribers observe the rename as a live update.
    let roster = b.roster().borrow().clone();
    assert_eq!(roster[0].nickname, "Campus Guide");
    assert!(roster[0].updated_at_ms >= before);
}

#[tokio::test]
async fn test_nickname_loaded_at_startup() {
    let store = Arc::new(MemoryStore::new());
    let dir = tempfile::tempdir().unwrap();
    Preferences::new(dir.path()).save_nickname("Returning").unwrap();

    let preferences = Preferences::new(dir.path());
    let mut client =
        PresenceClient::new(Arc::clone(&store), NetworkConfig::default(), preferences);
    assert_eq!(client.nickname(), "Returning");

    client.connect().await.unwrap();
    let row = store.row(client.user_id().unwrap()).await.unwrap();
    assert_eq!(row.nickname, "Returning");
}

#[tokio::test]
async fn test_nickname_normalized() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();

    client.update_nickname("").await;
    assert_eq!(client.nickname(), "Player");

    client.update_nickname(&"x".repeat(50)).await;
    assert_eq!(client.nickname().chars().count(), 20);
}

#[tokio::test]
async fn test_reconnect_replaces_ghost_row() {
    let store = Arc::new(MemoryStore::new());
    let (mut client, _dir) = test_client(&store);
    client.connect().await.unwrap();

    client.publish_pose(Vec3::new(50.0, 0.0, 50.0), 1.0);
    settle().await;

    // Abrupt-teardown reconnect: the old row is deleted, a fresh spawn row
    // inserted, never two rows for one identity.
    client.disconnect().await;
    client.connect().await.unwrap();

    assert_eq!(store.row_count().await, 1);
    let row = store.row(client.user_id().unwrap()).await.unwrap();
    assert_eq!(row.position, SPAWN_POSITION);
}
