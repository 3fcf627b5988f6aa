//! Release carries no holder token: it clears whatever lease is in place.
//!
//! This pins the current unauthenticated-release behavior rather than
//! fixing it; the ownership question is tracked in DESIGN.md.

use crate::prelude;
use solo_core::{Lease, LeaseLock, LeaseStore, LockConfig, TimeSource};
use std::time::Duration;

#[tokio::test]
async fn a_stranger_can_clear_a_live_lease() {
    let store = prelude::store();

    let holder = LeaseLock::new(store.clone(), LockConfig::new("nightly-sync"));
    holder.acquire().await.unwrap();

    // The holder's lease is live, yet a caller that never acquired can
    // delete it outright.
    let raw = store.get("lock:nightly-sync").await.unwrap().unwrap();
    let lease = Lease::from_value(&raw).unwrap();
    let now = store.now().await.unwrap();
    assert!(!lease.is_stale(now));

    let stranger = LeaseLock::new(
        store.clone(),
        LockConfig::new("nightly-sync").with_poll_interval(Duration::from_millis(10)),
    );
    stranger.release().await.unwrap();

    assert!(store.peek("lock:nightly-sync").is_none());

    // And the freed key is acquirable without waiting out the old lease
    tokio::time::timeout(Duration::from_millis(200), stranger.acquire())
        .await
        .unwrap()
        .unwrap();
}
