// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store protocol for lease coordination
//!
//! Thin traits over the shared key-value store: the four single-key
//! atomic operations the lock needs, and the store's authoritative
//! clock. The store client is injected wherever these traits are
//! consumed; there is no process-wide client.

use crate::timestamp::Timestamp;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the shared store
///
/// Propagated uncaught from lock acquisition and release; nothing in
/// this crate retries a failed store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Single-key atomic operations on the shared store
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Create `key` with `value` only if the key is absent.
    /// Returns true if this call created the key.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// Read the value under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally write `value` under `key`, returning the value in
    /// place immediately before the write
    async fn swap(&self, key: &str, value: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// The store's authoritative clock
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// One round trip to the store's clock
    async fn now(&self) -> Result<Timestamp, StoreError>;
}
