// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe source listing adapter.
//!
//! The remote source publishes a JSON directory listing of recipe files
//! (`[{"name": ..., "download_url": ...}]`); each download URL returns the
//! raw file bytes.

use crate::http::AdapterError;
use async_trait::async_trait;
use serde::Deserialize;

/// One entry of the remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeFile {
    pub name: String,
    pub download_url: String,
}

#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn list(&self) -> Result<Vec<RecipeFile>, AdapterError>;

    async fn fetch(&self, file: &RecipeFile) -> Result<Vec<u8>, AdapterError>;
}

pub struct HttpRecipeSource {
    client: reqwest::Client,
    listing_url: String,
}

impl HttpRecipeSource {
    pub fn new(client: reqwest::Client, listing_url: impl Into<String>) -> Self {
        Self { client, listing_url: listing_url.into() }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, AdapterError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| AdapterError::Request { url: url.to_string(), source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response)
    }
}

#[async_trait]
impl RecipeSource for HttpRecipeSource {
    async fn list(&self) -> Result<Vec<RecipeFile>, AdapterError> {
        let response = self.get(&self.listing_url).await?;
        let entries: Vec<ListingEntry> = response
            .json()
            .await
            .map_err(|source| AdapterError::Request { url: self.listing_url.clone(), source })?;
        // Listings may include directories or entries without a download link.
        Ok(entries
            .into_iter()
            .filter_map(|e| Some(RecipeFile { name: e.name, download_url: e.download_url? }))
            .collect())
    }

    async fn fetch(&self, file: &RecipeFile) -> Result<Vec<u8>, AdapterError> {
        let response = self.get(&file.download_url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| AdapterError::Request { url: file.download_url.clone(), source })?;
        Ok(bytes.to_vec())
    }
}

#[derive(Deserialize)]
struct ListingEntry {
    name: String,
    #[serde(default)]
    download_url: Option<String>,
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
