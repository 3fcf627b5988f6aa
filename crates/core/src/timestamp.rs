// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store-clock timestamps
//!
//! Every expiry decision compares timestamps read from the shared store's
//! clock, never a caller's local clock, so skew between machines cannot
//! cause premature or delayed lease reclamation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const MICROS_PER_SEC: u32 = 1_000_000;

/// A reading of the shared store's clock: whole seconds plus a
/// microsecond remainder.
///
/// Ordering is seconds first, then microseconds, matching how the stored
/// expiry is compared against the current store time.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    secs: u64,
    micros: u32,
}

/// Error decoding a timestamp from its stored text form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed timestamp value: {value:?}")]
pub struct ParseTimestampError {
    pub value: String,
}

impl Timestamp {
    /// Build a timestamp, normalizing an overflowing microsecond part
    /// into whole seconds.
    pub fn new(secs: u64, micros: u32) -> Self {
        Self {
            secs: secs + u64::from(micros / MICROS_PER_SEC),
            micros: micros % MICROS_PER_SEC,
        }
    }

    pub fn secs(&self) -> u64 {
        self.secs
    }

    pub fn micros(&self) -> u32 {
        self.micros
    }
}

impl std::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::new(
            self.secs.saturating_add(rhs.as_secs()),
            self.micros + rhs.subsec_micros(),
        )
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.secs, self.micros)
    }
}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseTimestampError {
            value: s.to_string(),
        };

        let (secs, micros) = s.split_once(',').ok_or_else(malformed)?;
        let secs: u64 = secs.trim().parse().map_err(|_| malformed())?;
        let micros: u32 = micros.trim().parse().map_err(|_| malformed())?;
        if micros >= MICROS_PER_SEC {
            return Err(malformed());
        }

        Ok(Timestamp { secs, micros })
    }
}

#[cfg(test)]
#[path = "timestamp_tests.rs"]
mod tests;
