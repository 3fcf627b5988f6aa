// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease values stored under lock keys

use crate::timestamp::{ParseTimestampError, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A time-bounded claim on a lock key, valid until its recorded expiry.
///
/// The key outlives the claim: a stale lease stays in the store until a
/// contender reclaims the key or the holder's release deletes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub expires_at: Timestamp,
}

impl Lease {
    /// Lease starting at `now`, live for `duration`
    pub fn starting_at(now: Timestamp, duration: Duration) -> Self {
        Self {
            expires_at: now + duration,
        }
    }

    /// A lease is stale once its expiry is strictly before `now`.
    /// An expiry equal to the current store time is still live.
    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.expires_at < now
    }

    /// Encode as the text value stored under the lock key
    pub fn to_value(&self) -> String {
        self.expires_at.to_string()
    }

    /// Decode from a stored text value
    pub fn from_value(value: &str) -> Result<Self, ParseTimestampError> {
        Ok(Self {
            expires_at: value.parse()?,
        })
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
