// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake adapters for tests.

use crate::approval::ApprovalClient;
use crate::http::AdapterError;
use crate::source::{RecipeFile, RecipeSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};

/// In-memory recipe source. Files registered with [`Self::with_broken`]
/// are listed but fail to download.
#[derive(Default)]
pub struct FakeRecipeSource {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    broken: Mutex<HashSet<String>>,
    list_fails: Mutex<bool>,
}

impl FakeRecipeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.set_file(name, content);
        self
    }

    pub fn with_broken(self, name: &str) -> Self {
        self.broken.lock().insert(name.to_string());
        self
    }

    pub fn set_file(&self, name: &str, content: impl Into<Vec<u8>>) {
        self.files.lock().insert(name.to_string(), content.into());
    }

    pub fn set_list_fails(&self, fails: bool) {
        *self.list_fails.lock() = fails;
    }

    fn url_for(name: &str) -> String {
        format!("fake://recipes/{}", name)
    }
}

#[async_trait]
impl RecipeSource for FakeRecipeSource {
    async fn list(&self) -> Result<Vec<RecipeFile>, AdapterError> {
        if *self.list_fails.lock() {
            return Err(AdapterError::Status { url: "fake://recipes".to_string(), status: 503 });
        }
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.extend(self.broken.lock().iter().cloned());
        names.sort();
        names.dedup();
        Ok(names
            .into_iter()
            .map(|name| RecipeFile { download_url: Self::url_for(&name), name })
            .collect())
    }

    async fn fetch(&self, file: &RecipeFile) -> Result<Vec<u8>, AdapterError> {
        if self.broken.lock().contains(&file.name) {
            return Err(AdapterError::Status { url: file.download_url.clone(), status: 404 });
        }
        self.files
            .lock()
            .get(&file.name)
            .cloned()
            .ok_or_else(|| AdapterError::Status { url: file.download_url.clone(), status: 404 })
    }
}

/// Approval client answering from a fixed set of `(name, version)` pairs
/// and recording every query.
#[derive(Default)]
pub struct FakeApprovalClient {
    approved: Mutex<HashSet<(String, String)>>,
    failing: Mutex<HashSet<(String, String)>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeApprovalClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approve(self, name: &str, version: &str) -> Self {
        self.approved.lock().insert((name.to_string(), version.to_string()));
        self
    }

    /// Simulate a transport failure for one version.
    pub fn fail(self, name: &str, version: &str) -> Self {
        self.failing.lock().insert((name.to_string(), version.to_string()));
        self
    }

    pub fn revoke_all(&self) {
        self.approved.lock().clear();
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ApprovalClient for FakeApprovalClient {
    async fn is_approved(&self, name: &str, version: &str) -> Result<bool, AdapterError> {
        let key = (name.to_string(), version.to_string());
        self.calls.lock().push(key.clone());
        if self.failing.lock().contains(&key) {
            return Err(AdapterError::Status { url: format!("fake://approval/{}/{}", name, version), status: 504 });
        }
        Ok(self.approved.lock().contains(&key))
    }
}
