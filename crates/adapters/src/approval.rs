// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template approval service adapter.

use crate::http::AdapterError;
use async_trait::async_trait;

/// Header carrying the approval service API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

#[async_trait]
pub trait ApprovalClient: Send + Sync {
    /// Whether `version` of recipe `name` is currently approved.
    ///
    /// `Ok(false)` for any non-200 answer; `Err` only for transport failures.
    async fn is_approved(&self, name: &str, version: &str) -> Result<bool, AdapterError>;
}

pub struct HttpApprovalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpApprovalClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into(), api_key: api_key.into() }
    }

    fn url_for(&self, name: &str, version: &str) -> String {
        format!("{}/{}/{}", self.base_url.trim_end_matches('/'), name, version)
    }
}

#[async_trait]
impl ApprovalClient for HttpApprovalClient {
    async fn is_approved(&self, name: &str, version: &str) -> Result<bool, AdapterError> {
        let url = self.url_for(name, version);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.clone(), source })?;
        let approved = response.status() == reqwest::StatusCode::OK;
        if !approved {
            tracing::debug!(recipe = name, version, status = %response.status(), "version not approved");
        }
        Ok(approved)
    }
}

#[cfg(test)]
#[path = "approval_tests.rs"]
mod tests;
