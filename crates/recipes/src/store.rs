// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local recipe directory kept in sync with a remote source.

use crate::naming;
use prov_adapters::RecipeSource;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Outcome of one sync with the remote source.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreRefresh {
    /// Remote refresh is disabled (no source configured) or the listing failed.
    pub skipped: bool,
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub failed: Vec<String>,
}

pub struct RecipeStore {
    dir: PathBuf,
    source: Option<Arc<dyn RecipeSource>>,
}

impl RecipeStore {
    pub fn new(dir: impl Into<PathBuf>, source: Option<Arc<dyn RecipeSource>>) -> Self {
        Self { dir: dir.into(), source }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pull every listed file into the local directory.
    ///
    /// A failed download is logged and skipped. Files whose content is
    /// unchanged are left untouched.
    pub async fn refresh(&self) -> StoreRefresh {
        let mut report = StoreRefresh::default();
        let Some(source) = &self.source else {
            tracing::debug!("no recipe source configured, keeping local recipes");
            report.skipped = true;
            return report;
        };

        let files = match source.list().await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list recipe source, keeping local recipes");
                report.skipped = true;
                return report;
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to create recipe directory");
            report.skipped = true;
            return report;
        }

        for file in files {
            if !naming::is_safe_file_name(&file.name) {
                tracing::warn!(file = %file.name, "skipping recipe file with unsafe name");
                report.failed.push(file.name);
                continue;
            }
            let bytes = match source.fetch(&file).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(file = %file.name, error = %e, "failed to fetch recipe file");
                    report.failed.push(file.name);
                    continue;
                }
            };
            let path = self.dir.join(&file.name);
            if content_matches(&path, &bytes).await {
                report.unchanged.push(file.name);
                continue;
            }
            match tokio::fs::write(&path, &bytes).await {
                Ok(()) => {
                    tracing::debug!(file = %file.name, "updated recipe file");
                    report.written.push(file.name);
                }
                Err(e) => {
                    tracing::warn!(file = %file.name, error = %e, "failed to write recipe file");
                    report.failed.push(file.name);
                }
            }
        }

        tracing::info!(
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "recipe source synced"
        );
        report
    }

    /// Metadata files present locally, as `(recipe name, path)` sorted by name.
    pub fn list_metadata_files(&self) -> std::io::Result<Vec<(String, PathBuf)>> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(recipe) = naming::recipe_from_metadata_file(file_name) {
                found.push((recipe.to_string(), entry.path()));
            }
        }
        found.sort();
        Ok(found)
    }

    /// Task file for a recipe, preferring the site-specific variant.
    pub fn task_file(&self, name: &str, site: Option<&str>) -> Option<PathBuf> {
        if let Some(site) = site.filter(|s| !s.is_empty()) {
            let site_path = self.dir.join(naming::site_task_file(name, site));
            if site_path.is_file() {
                return Some(site_path);
            }
        }
        let path = self.dir.join(naming::task_file(name));
        path.is_file().then_some(path)
    }

    pub fn vars_file(&self, name: &str) -> PathBuf {
        self.dir.join(naming::vars_file(name))
    }

    /// Path of an arbitrary file in the recipe directory.
    pub fn file(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

async fn content_matches(path: &Path, bytes: &[u8]) -> bool {
    match tokio::fs::read(path).await {
        Ok(existing) => Sha256::digest(&existing) == Sha256::digest(bytes),
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
