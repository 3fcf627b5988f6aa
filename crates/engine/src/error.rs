// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for guarded execution

use solo_core::lock::LockError;
use std::time::Duration;
use thiserror::Error;

/// Failure produced by the guarded work itself
#[derive(Debug, Error)]
pub enum WorkFailure {
    /// Isolated work exited with a nonzero status
    #[error("command exited with status {code:?}: {stderr}")]
    Command {
        /// Exit code, absent when the process died to a signal
        code: Option<i32>,
        stderr: String,
    },
    /// Cooperative work returned an error
    #[error("{0}")]
    Task(Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced by a guarded invocation
///
/// Every variant is delivered with the lock released; nothing is
/// swallowed on the way back to the caller.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The bounded execution did not finish in time
    #[error("guarded execution exceeded {limit:?}")]
    Timeout { limit: Duration },
    /// The guarded work failed; resurfaced transparently
    #[error("guarded work failed: {0}")]
    Work(WorkFailure),
    /// Lock acquisition or release against the store failed
    #[error(transparent)]
    Lock(#[from] LockError),
    /// The isolate process could not be spawned, awaited, or killed
    #[error("isolate process error: {0}")]
    Process(#[source] std::io::Error),
    /// The isolate finished but never published an outcome.
    ///
    /// Distinct from `Timeout`: the deadline held, the outcome was lost.
    #[error("isolate finished without publishing an outcome")]
    OutcomeMissing,
}
