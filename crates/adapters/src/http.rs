// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared HTTP client plumbing.

use std::time::Duration;
use thiserror::Error;

/// Per-request timeout for collaborator calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, AdapterError> {
    reqwest::Client::builder().timeout(timeout).build().map_err(AdapterError::Client)
}
