// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::state::ProvisioningState;
    use proptest::prelude::*;

    pub fn arb_state() -> impl Strategy<Value = ProvisioningState> {
        prop_oneof![
            Just(ProvisioningState::PrepareBuild),
            Just(ProvisioningState::BuildRunning),
            Just(ProvisioningState::Active),
            Just(ProvisioningState::BuildFailed),
        ]
    }
}
