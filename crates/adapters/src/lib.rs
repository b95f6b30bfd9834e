// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the HTTP collaborators of the provisioning daemon:
//! the recipe source listing and the template approval service.

pub mod approval;
mod http;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use approval::{ApprovalClient, HttpApprovalClient, API_KEY_HEADER};
pub use http::{build_client, AdapterError, DEFAULT_HTTP_TIMEOUT};
pub use source::{HttpRecipeSource, RecipeFile, RecipeSource};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeApprovalClient, FakeRecipeSource};
