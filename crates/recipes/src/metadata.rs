// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe metadata parsing

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Parsed metadata of one recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeMetadata {
    pub name: String,
    /// Inbound port the recipe's service listens on
    pub port: u16,
    pub security_group_name: String,
    pub security_group_description: String,
    /// Whether the security group also needs an SSH-style inbound rule
    pub security_group_ssh: bool,
    pub direction: Direction,
    pub protocol: Protocol,
    /// Free-form information shown to users
    pub information_for_display: IndexMap<String, serde_yaml::Value>,
    /// Whether usable versions must be confirmed by the approval service
    pub needs_approval: bool,
    /// Candidate versions offered to the approval service
    #[serde(default)]
    pub versions: Vec<String>,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed metadata in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path} describes recipe {found:?}, expected {expected:?}")]
    NameMismatch { path: PathBuf, expected: String, found: String },
}

impl RecipeMetadata {
    pub fn parse(content: &str, path: &Path) -> Result<Self, MetadataError> {
        serde_yaml::from_str(content)
            .map_err(|source| MetadataError::Parse { path: path.to_path_buf(), source })
    }

    /// Load a metadata file, checking that the recipe name inside agrees
    /// with the name encoded in the file name.
    pub fn load(path: &Path, expected_name: &str) -> Result<Self, MetadataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| MetadataError::Read { path: path.to_path_buf(), source })?;
        let metadata = Self::parse(&content, path)?;
        if metadata.name != expected_name {
            return Err(MetadataError::NameMismatch {
                path: path.to_path_buf(),
                expected: expected_name.to_string(),
                found: metadata.name,
            });
        }
        Ok(metadata)
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
