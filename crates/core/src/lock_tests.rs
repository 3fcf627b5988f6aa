use super::*;
use crate::memory::MemoryStore;
use std::time::Instant;
use tokio::time::timeout;

fn test_config(name: &str) -> LockConfig {
    LockConfig::new(name).with_poll_interval(Duration::from_millis(10))
}

fn lock_pair(name: &str) -> (Arc<MemoryStore>, LeaseLock<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let lock = LeaseLock::new(store.clone(), test_config(name));
    (store, lock)
}

#[test]
fn key_carries_lock_prefix() {
    let config = LockConfig::new("refresh-report");
    assert_eq!(config.key(), "lock:refresh-report");
}

#[tokio::test]
async fn acquire_free_key_succeeds() {
    let (store, lock) = lock_pair("free");

    lock.acquire().await.unwrap();

    let raw = store.peek("lock:free").unwrap();
    let lease = Lease::from_value(&raw).unwrap();
    let now = store.now().await.unwrap();
    assert!(!lease.is_stale(now));
}

#[tokio::test]
async fn release_deletes_key() {
    let (store, lock) = lock_pair("release");

    lock.acquire().await.unwrap();
    lock.release().await.unwrap();

    assert!(store.peek("lock:release").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn contended_acquire_waits_for_release() {
    let (store, lock) = lock_pair("contended");
    lock.acquire().await.unwrap();

    let waiter = LeaseLock::new(store.clone(), test_config("contended"));
    let handle = tokio::spawn(async move { waiter.acquire().await });

    // The contender polls while the lease is live
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    lock.release().await.unwrap();
    timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn stale_lease_reclaimed_within_poll_interval() {
    let store = Arc::new(MemoryStore::new());
    let holder = LeaseLock::new(
        store.clone(),
        test_config("stale").with_lease_duration(Duration::from_secs(1)),
    );
    holder.acquire().await.unwrap();

    // Age the holder's lease past its expiry without releasing
    store.advance(Duration::from_secs(2));

    let contender = LeaseLock::new(store.clone(), test_config("stale"));
    let started = Instant::now();
    timeout(Duration::from_millis(500), contender.acquire())
        .await
        .unwrap()
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn release_clears_foreign_live_lease() {
    // There is no holder token: release deletes whatever lease is in
    // place, even another caller's live one. Pinned behavior; see
    // DESIGN.md before "fixing".
    let (store, holder) = lock_pair("no-owner");
    holder.acquire().await.unwrap();

    let stranger = LeaseLock::new(store.clone(), test_config("no-owner"));
    stranger.release().await.unwrap();
    assert!(store.peek("lock:no-owner").is_none());

    timeout(Duration::from_millis(100), stranger.acquire())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn malformed_lease_value_is_an_error() {
    let (store, lock) = lock_pair("corrupt");
    store.swap("lock:corrupt", "not-a-lease").await.unwrap();

    let err = lock.acquire().await.unwrap_err();
    assert!(matches!(err, LockError::MalformedLease { ref key, .. } if key == "lock:corrupt"));
}

#[test]
fn fixed_poll_delay_without_backoff() {
    let (_store, lock) = lock_pair("poll");
    assert_eq!(lock.poll_delay(0), Duration::from_millis(10));
    assert_eq!(lock.poll_delay(20), Duration::from_millis(10));
}

#[test]
fn backoff_grows_and_caps_the_delay() {
    let store = Arc::new(MemoryStore::new());
    let config = test_config("backoff").with_backoff(BackoffConfig {
        multiplier: 2.0,
        max: Duration::from_millis(80),
        jitter: Duration::from_millis(5),
    });
    let lock = LeaseLock::new(store, config);

    let first = lock.poll_delay(0);
    let second = lock.poll_delay(1);
    let late = lock.poll_delay(12);

    assert!(first >= Duration::from_millis(10));
    assert!(second >= Duration::from_millis(20));
    assert!(late <= Duration::from_millis(85));
}

#[test]
fn config_serde_uses_humantime_durations() {
    let config = test_config("serde").with_lease_duration(Duration::from_secs(45));
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("45s"));
    assert!(json.contains("10ms"));

    let decoded: LockConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.name, "serde");
    assert_eq!(decoded.lease_duration, Duration::from_secs(45));
    assert_eq!(decoded.poll_interval, Duration::from_millis(10));
    assert!(decoded.backoff.is_none());
}
