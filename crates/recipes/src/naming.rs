// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe file naming conventions
//!
//! For a recipe `name` the local directory holds:
//! - `name.yml`: task file
//! - `name-<site>.yml`: site-specific task file override
//! - `name_vars_file.yml`: variables file
//! - `name_metadata.yml`: metadata
//!
//! plus an optional shared `job_template.yml`.

use regex::Regex;
use std::sync::LazyLock;

/// Matches `<recipe>_metadata.yml` and captures the recipe name.
// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static METADATA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9_-]*)_metadata\.ya?ml$")
        .expect("constant regex pattern is valid")
});

/// Generic job-definition template shared by all recipes.
pub const JOB_TEMPLATE_FILE: &str = "job_template.yml";

pub fn task_file(name: &str) -> String {
    format!("{}.yml", name)
}

pub fn site_task_file(name: &str, site: &str) -> String {
    format!("{}-{}.yml", name, site)
}

pub fn vars_file(name: &str) -> String {
    format!("{}_vars_file.yml", name)
}

pub fn metadata_file(name: &str) -> String {
    format!("{}_metadata.yml", name)
}

/// Recipe name encoded in a metadata file name, if it follows the convention.
pub fn recipe_from_metadata_file(file_name: &str) -> Option<&str> {
    METADATA_PATTERN.captures(file_name).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Whether a remotely listed file name is safe to write into the local
/// recipe directory (a plain file name, no separators, not hidden).
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;
