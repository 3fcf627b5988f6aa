// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight execution guard
//!
//! Composes the lease lock, an isolate, and a deadline: a named unit of
//! work runs at most once concurrently across every caller coordinating
//! through the same store, and each invocation is bounded by a maximum
//! execution time.
//!
//! The execution path is fixed when the work is wrapped, not per call:
//! blocking work that cannot honor cancellation runs as a killable
//! subprocess (`guard_command`), natively cancellable async work runs
//! under a scheduler deadline (`guard`).

use crate::error::{GuardError, WorkFailure};
use crate::isolate::{run_bounded, WorkCommand, WorkOutput};
use serde::{Deserialize, Serialize};
use solo_core::lock::{BackoffConfig, LeaseLock, LockConfig};
use solo_core::store::{LeaseStore, TimeSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Guard configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Hard bound on a single execution of the guarded work
    #[serde(with = "humantime_serde")]
    pub max_execution_time: Duration,
    /// Lease time beyond the execution bound, covering polling and
    /// outcome-handoff overhead so a live isolate's lease cannot expire
    /// out from under it
    #[serde(with = "humantime_serde")]
    pub lease_buffer: Duration,
    /// Delay between lock acquisition attempts
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// How long a finished isolate's outcome is waited on
    #[serde(with = "humantime_serde")]
    pub outcome_wait: Duration,
    /// Optional backoff under lock contention
    pub backoff: Option<BackoffConfig>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_execution_time: Duration::from_secs(30),
            lease_buffer: Duration::from_secs(120),
            poll_interval: Duration::from_millis(100),
            outcome_wait: Duration::from_secs(1),
            backoff: None,
        }
    }
}

impl GuardConfig {
    pub fn with_max_execution_time(mut self, limit: Duration) -> Self {
        self.max_execution_time = limit;
        self
    }

    pub fn with_lease_buffer(mut self, buffer: Duration) -> Self {
        self.lease_buffer = buffer;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_outcome_wait(mut self, wait: Duration) -> Self {
        self.outcome_wait = wait;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Lease duration: the buffer plus the execution bound rounded up
    /// to whole seconds
    pub fn lease_duration(&self) -> Duration {
        let bounded_secs = self.max_execution_time.as_secs()
            + u64::from(self.max_execution_time.subsec_nanos() > 0);
        self.lease_buffer + Duration::from_secs(bounded_secs)
    }

    fn lock_config(&self, name: &str) -> LockConfig {
        let mut config = LockConfig::new(name)
            .with_lease_duration(self.lease_duration())
            .with_poll_interval(self.poll_interval);
        if let Some(backoff) = self.backoff.clone() {
            config = config.with_backoff(backoff);
        }
        config
    }
}

/// Entry point wrapping units of work in single-flight guards
///
/// Holds the injected store client; every guard built from the same
/// `SingleFlight` coordinates through the same store.
pub struct SingleFlight<S> {
    store: Arc<S>,
}

impl<S> Clone for SingleFlight<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> SingleFlight<S>
where
    S: LeaseStore + TimeSource,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Guard blocking work shaped as a subprocess, with the default
    /// execution bound
    pub fn guard_command(&self, name: &str, command: WorkCommand) -> GuardedCommand<S> {
        self.guard_command_with(name, command, GuardConfig::default())
    }

    /// Guard blocking work shaped as a subprocess
    pub fn guard_command_with(
        &self,
        name: &str,
        command: WorkCommand,
        config: GuardConfig,
    ) -> GuardedCommand<S> {
        let lock = LeaseLock::new(self.store.clone(), config.lock_config(name));
        GuardedCommand {
            lock,
            command,
            config,
        }
    }

    /// Guard natively cancellable async work, with the default
    /// execution bound
    pub fn guard<F>(&self, name: &str, work: F) -> GuardedTask<S, F> {
        self.guard_with(name, work, GuardConfig::default())
    }

    /// Guard natively cancellable async work
    pub fn guard_with<F>(&self, name: &str, work: F, config: GuardConfig) -> GuardedTask<S, F> {
        let lock = LeaseLock::new(self.store.clone(), config.lock_config(name));
        GuardedTask { lock, work, config }
    }
}

/// Single-flight wrapper around a subprocess unit of work (isolated path)
pub struct GuardedCommand<S> {
    lock: LeaseLock<S>,
    command: WorkCommand,
    config: GuardConfig,
}

impl<S> GuardedCommand<S>
where
    S: LeaseStore + TimeSource,
{
    pub fn key(&self) -> &str {
        self.lock.key()
    }

    /// Run the command under the guard.
    ///
    /// Blocks until the lock is held, runs the isolate with the
    /// configured deadline, and releases the lock on every exit path.
    pub async fn run(&self) -> Result<WorkOutput, GuardError> {
        let span = guard_span(self.lock.key(), "isolated");
        let bounded = run_bounded(
            &self.command,
            self.config.max_execution_time,
            self.config.outcome_wait,
        );
        run_locked(&self.lock, bounded).instrument(span).await
    }
}

/// Single-flight wrapper around cancellable async work (cooperative path)
pub struct GuardedTask<S, F> {
    lock: LeaseLock<S>,
    work: F,
    config: GuardConfig,
}

impl<S, F> GuardedTask<S, F>
where
    S: LeaseStore + TimeSource,
{
    pub fn key(&self) -> &str {
        self.lock.key()
    }

    /// Run the work under the guard.
    ///
    /// The work's future is dropped when the deadline elapses: one
    /// cancellation signal, delivered by the scheduler, no retry.
    pub async fn run<Fut, T, E>(&self) -> Result<T, GuardError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let span = guard_span(self.lock.key(), "cooperative");
        let limit = self.config.max_execution_time;
        let bounded = async move {
            match tokio::time::timeout(limit, (self.work)()).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(GuardError::Work(WorkFailure::Task(e.into()))),
                Err(_) => {
                    tracing::warn!(?limit, "deadline exceeded, work cancelled");
                    Err(GuardError::Timeout { limit })
                }
            }
        };
        run_locked(&self.lock, bounded).instrument(span).await
    }
}

fn guard_span(key: &str, path: &'static str) -> tracing::Span {
    let invocation = uuid::Uuid::new_v4();
    tracing::info_span!("guard", key, %invocation, path)
}

/// Shared orchestration core for both execution paths: hold the lock for
/// the whole bounded execution, release on every exit path, surface the
/// outcome untouched.
async fn run_locked<S, T, Fut>(lock: &LeaseLock<S>, bounded: Fut) -> Result<T, GuardError>
where
    S: LeaseStore + TimeSource,
    Fut: Future<Output = Result<T, GuardError>>,
{
    lock.acquire().await?;
    let outcome = bounded.await;
    if let Err(e) = &outcome {
        tracing::warn!(key = %lock.key(), error = %e, "guarded execution failed");
    }
    lock.release().await?;
    outcome
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
