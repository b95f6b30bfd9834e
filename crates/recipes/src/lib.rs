// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Research-environment recipes: local fragment store and metadata registry

pub mod metadata;
pub mod naming;
pub mod registry;
pub mod store;

pub use metadata::{Direction, MetadataError, Protocol, RecipeMetadata};
pub use registry::{RecipeRegistry, RefreshSummary};
pub use store::{RecipeStore, StoreRefresh};
