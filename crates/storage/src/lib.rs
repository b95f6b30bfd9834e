// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable provisioning state for the provisioning daemon

mod file;
#[cfg(any(test, feature = "test-support"))]
mod memory;
pub mod records;
mod store;

pub use file::FileStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryStore;
pub use records::{ProvisioningRecord, StoredLogs};
pub use store::{Fields, StateStore, StoreError};
