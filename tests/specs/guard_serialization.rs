//! Two simultaneous callers of the same guarded work never overlap.

use crate::prelude;
use solo_engine::{GuardConfig, SingleFlight};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[tokio::test(flavor = "multi_thread")]
async fn simultaneous_callers_serialize() {
    let store = prelude::store();
    let flight = SingleFlight::new(store);

    let config = GuardConfig::default()
        .with_max_execution_time(Duration::from_secs(2))
        .with_poll_interval(Duration::from_millis(20));

    // Each execution records its own window so overlap is observable
    let windows: Arc<Mutex<Vec<(Instant, Instant)>>> = Arc::new(Mutex::new(Vec::new()));

    let caller = |windows: Arc<Mutex<Vec<(Instant, Instant)>>>| {
        let flight = flight.clone();
        let config = config.clone();
        async move {
            let guarded = flight.guard_with(
                "shared-report",
                move || {
                    let windows = windows.clone();
                    async move {
                        let started = Instant::now();
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        windows.lock().unwrap().push((started, Instant::now()));
                        Ok::<_, Infallible>(42)
                    }
                },
                config,
            );
            guarded.run().await
        }
    };

    let begun = Instant::now();
    let (a, b) = tokio::join!(caller(windows.clone()), caller(windows.clone()));

    // Both callers complete with the work's value
    assert_eq!(a.unwrap(), 42);
    assert_eq!(b.unwrap(), 42);

    // The two execution windows never overlap: the second caller polled
    // until the first released, so total latency is roughly two runs.
    let windows = windows.lock().unwrap();
    assert_eq!(windows.len(), 2);
    let (a_start, a_end) = windows[0];
    let (b_start, b_end) = windows[1];
    assert!(a_end <= b_start || b_end <= a_start, "executions overlapped");
    assert!(begun.elapsed() >= Duration::from_secs(2));
}
