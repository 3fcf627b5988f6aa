// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease-based distributed lock
//!
//! Mutual exclusion across independent callers coordinated through the
//! shared store: a caller claims a lock key with a lease, and contenders
//! may reclaim the key once the lease expires. Staleness is always judged
//! against the store's clock, never a caller's local clock.

use crate::lease::Lease;
use crate::store::{LeaseStore, StoreError, TimeSource};
use crate::timestamp::ParseTimestampError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Prefix distinguishing lock keys from other keys in the shared store
const KEY_PREFIX: &str = "lock:";

/// Errors from lock acquisition and release
#[derive(Debug, Error)]
pub enum LockError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The value under the lock key did not decode as a lease
    #[error("malformed lease under {key}: {source}")]
    MalformedLease {
        key: String,
        source: ParseTimestampError,
    },
}

/// Backoff applied to the poll delay under contention
///
/// Off by default: the plain fixed-interval poll is a thundering herd
/// against the store when many callers contend, which is acceptable at
/// low contention and tunable here when it is not.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Factor applied to the delay after each contended attempt
    pub multiplier: f64,
    /// Ceiling for the grown delay
    #[serde(with = "humantime_serde")]
    pub max: Duration,
    /// Random extra delay of up to this much per sleep, spreading
    /// contenders apart
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            multiplier: 2.0,
            max: Duration::from_secs(2),
            jitter: Duration::from_millis(100),
        }
    }
}

/// Lock configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockConfig {
    /// Name of the guarded unit of work. Two distinct units must not
    /// share a name: a collision silently serializes them against each
    /// other.
    pub name: String,
    /// How long a claimed lease stays live
    #[serde(with = "humantime_serde")]
    pub lease_duration: Duration,
    /// Delay between acquisition attempts while the key is held
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Optional backoff under contention; fixed interval when absent
    pub backoff: Option<BackoffConfig>,
}

impl LockConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lease_duration: Duration::from_secs(150),
            poll_interval: Duration::from_millis(100),
            backoff: None,
        }
    }

    pub fn with_lease_duration(mut self, duration: Duration) -> Self {
        self.lease_duration = duration;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Store key this lock coordinates through
    pub fn key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.name)
    }
}

/// A scoped-acquisition lock over a shared store
pub struct LeaseLock<S> {
    store: Arc<S>,
    config: LockConfig,
    key: String,
}

impl<S> LeaseLock<S>
where
    S: LeaseStore + TimeSource,
{
    pub fn new(store: Arc<S>, config: LockConfig) -> Self {
        let key = config.key();
        Self { store, config, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Block until this caller holds the lock.
    ///
    /// There is no acquisition deadline: a caller waits forever if the
    /// lease can never be freed. Store errors propagate immediately.
    pub async fn acquire(&self) -> Result<(), LockError> {
        let mut attempt: u32 = 0;
        loop {
            let now = self.store.now().await?;
            let candidate = Lease::starting_at(now, self.config.lease_duration);
            let value = candidate.to_value();

            if self.store.set_if_absent(&self.key, &value).await? {
                tracing::debug!(key = %self.key, expires_at = %candidate.expires_at, "lock acquired");
                return Ok(());
            }

            let Some(raw) = self.store.get(&self.key).await? else {
                // Freed between the claim attempt and the read; try again
                // without sleeping.
                continue;
            };
            let existing = self.decode(&raw)?;

            let now = self.store.now().await?;
            if existing.is_stale(now) {
                // Two contenders can observe the same stale lease. The swap
                // returns the value in place just before our write; only the
                // caller that swapped out a still-stale (or absent) value
                // holds the key, the other lost and must retry.
                let previous = self.store.swap(&self.key, &value).await?;
                if self.won_reclamation(previous).await? {
                    tracing::debug!(key = %self.key, expires_at = %candidate.expires_at, "stale lease reclaimed");
                    return Ok(());
                }
                tracing::trace!(key = %self.key, "lost reclamation race");
            } else {
                tracing::trace!(key = %self.key, holder_expires_at = %existing.expires_at, "lock contended");
            }

            tokio::time::sleep(self.poll_delay(attempt)).await;
            attempt = attempt.saturating_add(1);
        }
    }

    /// Release the lock by deleting its key.
    ///
    /// The delete is unconditional: leases carry no holder token, so any
    /// caller can clear any holder's lease. See DESIGN.md.
    pub async fn release(&self) -> Result<(), LockError> {
        self.store.delete(&self.key).await?;
        tracing::debug!(key = %self.key, "lock released");
        Ok(())
    }

    async fn won_reclamation(&self, previous: Option<String>) -> Result<bool, LockError> {
        let Some(raw) = previous else {
            // Nothing was in place before our swap: no live holder.
            return Ok(true);
        };
        let lease = self.decode(&raw)?;
        let now = self.store.now().await?;
        Ok(lease.is_stale(now))
    }

    fn decode(&self, raw: &str) -> Result<Lease, LockError> {
        Lease::from_value(raw).map_err(|source| LockError::MalformedLease {
            key: self.key.clone(),
            source,
        })
    }

    fn poll_delay(&self, attempt: u32) -> Duration {
        let base = self.config.poll_interval;
        let Some(backoff) = &self.config.backoff else {
            return base;
        };

        let factor = backoff.multiplier.max(1.0).powi(attempt.min(16) as i32);
        let grown = (base.as_secs_f64() * factor).min(backoff.max.as_secs_f64());
        let jitter = backoff.jitter.as_secs_f64() * rand::rng().random_range(0.0..1.0);
        Duration::from_secs_f64(grown + jitter)
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
