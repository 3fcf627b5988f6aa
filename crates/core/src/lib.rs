// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! solo-core: coordination core for the solo single-flight guard
//!
//! This crate provides:
//! - Store-clock timestamps and lease values
//! - The lease-store protocol traits (injected, never a process global)
//! - A lease-based distributed lock with stale reclamation

pub mod lease;
pub mod lock;
pub mod store;
pub mod timestamp;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod memory;

// Re-exports
pub use lease::Lease;
pub use lock::{BackoffConfig, LeaseLock, LockConfig, LockError};
pub use store::{LeaseStore, StoreError, TimeSource};
pub use timestamp::{ParseTimestampError, Timestamp};

#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
