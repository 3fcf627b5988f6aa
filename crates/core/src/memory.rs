// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::store::{LeaseStore, StoreError, TimeSource};
use crate::timestamp::Timestamp;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// Arbitrary epoch offset so store timestamps look like wall-clock seconds
const BASE_EPOCH_SECS: u64 = 1_700_000_000;

/// In-memory implementation of the store protocol with a controllable
/// clock.
///
/// The clock tracks real elapsed time and can additionally be advanced
/// by hand, so tests can age a lease into staleness without sleeping.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    started: Instant,
    skew: Arc<Mutex<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            started: Instant::now(),
            skew: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the store clock by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut skew = self.skew.lock().unwrap_or_else(|e| e.into_inner());
        *skew += duration;
    }

    /// Read the value under `key` without going through the protocol
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn clock(&self) -> Timestamp {
        let skew = *self.skew.lock().unwrap_or_else(|e| e.into_inner());
        let elapsed = self.started.elapsed() + skew;
        Timestamp::new(BASE_EPOCH_SECS + elapsed.as_secs(), elapsed.subsec_micros())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.peek(key))
    }

    async fn swap(&self, key: &str, value: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.insert(key.to_string(), value.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

#[async_trait]
impl TimeSource for MemoryStore {
    async fn now(&self) -> Result<Timestamp, StoreError> {
        Ok(self.clock())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
