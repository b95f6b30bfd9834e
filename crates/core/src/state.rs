// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning state machine.
//!
//! ```text
//! PREPARE_BUILD → BUILD_RUNNING → { ACTIVE, BUILD_FAILED }
//! ```
//!
//! `ACTIVE` and `BUILD_FAILED` are terminal until the record is deleted.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Durable provisioning state of a VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningState {
    /// VM created, job pending
    PrepareBuild,
    /// Runner process launched
    BuildRunning,
    /// Runner exited zero
    Active,
    /// Runner exited non-zero (or was lost)
    BuildFailed,
}

crate::simple_display! {
    ProvisioningState {
        PrepareBuild => "PREPARE_BUILD",
        BuildRunning => "BUILD_RUNNING",
        Active => "ACTIVE",
        BuildFailed => "BUILD_FAILED",
    }
}

impl ProvisioningState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Active | Self::BuildFailed)
    }

    /// Whether moving from `self` to `next` is a forward transition.
    ///
    /// Re-asserting the current state is allowed (idempotent writes).
    pub fn can_advance_to(self, next: Self) -> bool {
        use ProvisioningState::*;
        self == next
            || matches!((self, next), (PrepareBuild, BuildRunning) | (BuildRunning, Active | BuildFailed))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provisioning state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for ProvisioningState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREPARE_BUILD" => Ok(Self::PrepareBuild),
            "BUILD_RUNNING" => Ok(Self::BuildRunning),
            "ACTIVE" => Ok(Self::Active),
            "BUILD_FAILED" => Ok(Self::BuildFailed),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
