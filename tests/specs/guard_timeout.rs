//! A guarded run that exceeds its bound fails fast and leaves the key free.

use crate::prelude;
use solo_engine::{GuardConfig, GuardError, SingleFlight, WorkCommand};
use std::time::{Duration, Instant};

fn sh(script: &str) -> WorkCommand {
    WorkCommand::new("sh").arg("-c").arg(script)
}

#[tokio::test(flavor = "multi_thread")]
async fn overrunning_work_times_out_and_recovers() {
    let store = prelude::store();
    let flight = SingleFlight::new(store.clone());

    let config = GuardConfig::default()
        .with_max_execution_time(Duration::from_secs(1))
        .with_poll_interval(Duration::from_millis(20));

    // Work sleeps 5s against a 1s bound: the caller gets the timeout at
    // ~1s, not after the sleep finishes.
    let guarded = flight.guard_command_with("overrun", sh("sleep 5"), config.clone());
    let started = Instant::now();
    let err = guarded.run().await.unwrap_err();

    assert!(matches!(err, GuardError::Timeout { .. }));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3), "timeout took {elapsed:?}");

    // No permanent deadlock: the lock is free immediately afterwards and
    // the next caller acquires promptly.
    assert!(store.peek("lock:overrun").is_none());

    let retry = flight.guard_command_with("overrun", sh("printf recovered"), config);
    let started = Instant::now();
    let output = retry.run().await.unwrap();
    assert_eq!(output.stdout, "recovered");
    assert!(started.elapsed() < Duration::from_secs(1));
}
