// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! solo-engine: bounded single-flight execution
//!
//! The public guard surface: wrap a named unit of work so that it runs
//! at most once concurrently across independent callers, bounded by a
//! maximum execution time, coordinated through an injected lease store.

mod error;
mod guard;
mod isolate;

pub use error::{GuardError, WorkFailure};
pub use guard::{GuardConfig, GuardedCommand, GuardedTask, SingleFlight};
pub use isolate::{WorkCommand, WorkOutput};

// The contention knobs come from the coordination core
pub use solo_core::lock::BackoffConfig;
