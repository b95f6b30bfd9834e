// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory recipe catalog plus the versions the approval service allows.
//!
//! Each refresh rebuilds both tables from scratch and swaps them in under
//! the write lock; readers never observe a half-built catalog.

use crate::metadata::RecipeMetadata;
use crate::store::{RecipeStore, StoreRefresh};
use parking_lot::RwLock;
use prov_adapters::ApprovalClient;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Tables {
    metadata: BTreeMap<String, RecipeMetadata>,
    /// recipe → approved versions, newest first
    approved: HashMap<String, Vec<String>>,
}

/// Result of one registry refresh.
#[derive(Debug, Default, Clone)]
pub struct RefreshSummary {
    pub store: StoreRefresh,
    pub loaded: usize,
    pub skipped: Vec<String>,
}

pub struct RecipeRegistry {
    store: RecipeStore,
    approval: Option<Arc<dyn ApprovalClient>>,
    tables: RwLock<Tables>,
}

impl RecipeRegistry {
    pub fn new(store: RecipeStore, approval: Option<Arc<dyn ApprovalClient>>) -> Self {
        Self { store, approval, tables: RwLock::new(Tables::default()) }
    }

    pub fn store(&self) -> &RecipeStore {
        &self.store
    }

    /// Sync the store, re-parse all metadata and re-query approvals.
    ///
    /// Malformed metadata files are skipped. If the local directory cannot
    /// be listed at all, the previous tables are kept.
    pub async fn refresh(&self) -> std::io::Result<RefreshSummary> {
        let store_report = self.store.refresh().await;
        let files = match self.store.list_metadata_files() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(dir = %self.store.dir().display(), error = %e, "failed to list recipe metadata, keeping previous catalog");
                return Err(e);
            }
        };

        let mut tables = Tables::default();
        let mut skipped = Vec::new();
        for (name, path) in files {
            match RecipeMetadata::load(&path, &name) {
                Ok(metadata) => {
                    tables.metadata.insert(name, metadata);
                }
                Err(e) => {
                    tracing::warn!(recipe = %name, error = %e, "skipping recipe metadata");
                    skipped.push(name);
                }
            }
        }

        for metadata in tables.metadata.values().filter(|m| m.needs_approval) {
            let versions = self.approved_versions_for(metadata).await;
            if versions.is_empty() {
                tracing::warn!(recipe = %metadata.name, "no approved versions, recipe unavailable");
            }
            tables.approved.insert(metadata.name.clone(), versions);
        }

        let loaded = tables.metadata.len();
        *self.tables.write() = tables;
        tracing::info!(loaded, skipped = skipped.len(), "recipe registry refreshed");
        Ok(RefreshSummary { store: store_report, loaded, skipped })
    }

    async fn approved_versions_for(&self, metadata: &RecipeMetadata) -> Vec<String> {
        let Some(approval) = &self.approval else {
            tracing::warn!(recipe = %metadata.name, "approval required but no approval service configured");
            return Vec::new();
        };
        let mut approved = Vec::new();
        for candidate in &metadata.versions {
            let version = match semver::Version::parse(candidate) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(recipe = %metadata.name, version = %candidate, error = %e, "ignoring non-semver version");
                    continue;
                }
            };
            match approval.is_approved(&metadata.name, candidate).await {
                Ok(true) => approved.push((version, candidate.clone())),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(recipe = %metadata.name, version = %candidate, error = %e, "approval check failed");
                }
            }
        }
        approved.sort_by(|a, b| b.0.cmp(&a.0));
        approved.dedup_by(|a, b| a.0 == b.0);
        approved.into_iter().map(|(_, raw)| raw).collect()
    }

    pub fn get(&self, name: &str) -> Option<RecipeMetadata> {
        self.tables.read().metadata.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.read().metadata.keys().cloned().collect()
    }

    /// Approved versions of a recipe, newest first. Empty for unknown
    /// recipes and for recipes that need no approval.
    pub fn get_approved_versions(&self, name: &str) -> Vec<String> {
        self.tables.read().approved.get(name).cloned().unwrap_or_default()
    }

    /// Pick the version to deploy: the requested one if approved, else the
    /// newest approved version.
    pub fn negotiate_version(&self, name: &str, requested: Option<&str>) -> Option<String> {
        let approved = self.get_approved_versions(name);
        if let Some(requested) = requested {
            if approved.iter().any(|v| v == requested) {
                return Some(requested.to_string());
            }
            tracing::info!(recipe = name, requested, "requested version not approved, using newest");
        }
        approved.into_iter().next()
    }

    /// Whether an image with these tags may be offered to callers.
    ///
    /// Images tagged with no known recipe are always allowed. Otherwise at
    /// least one tagged recipe must be usable: either it needs no approval
    /// or another tag of the image is one of its approved versions.
    pub fn is_image_allowed<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        let tables = self.tables.read();
        let mut tagged = tags.iter().filter_map(|t| tables.metadata.get(t.as_ref())).peekable();
        if tagged.peek().is_none() {
            return true;
        }
        tagged.any(|m| {
            !m.needs_approval
                || tables.approved.get(&m.name).is_some_and(|approved| {
                    tags.iter().any(|t| approved.iter().any(|v| v == t.as_ref()))
                })
        })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
