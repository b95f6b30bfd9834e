// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hash-record store abstraction.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Field map of one hash record.
pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid record key: {0:?}")]
    InvalidKey(String),

    #[error("corrupt record {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crash-surviving key/value store of hash records.
///
/// Implementations must be safe to share between request handlers; each
/// call is atomic with respect to other calls on the same key.
pub trait StateStore: Send + Sync {
    fn get_field(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// All fields of a record, or `None` if the record does not exist.
    fn get_all(&self, key: &str) -> Result<Option<Fields>, StoreError>;

    /// Merge `fields` into the record, creating it if needed.
    fn set_fields(&self, key: &str, fields: &Fields) -> Result<(), StoreError>;

    /// Apply `update` to an existing record under the store's write lock.
    ///
    /// Never creates a record: returns `Ok(false)` when `key` is missing.
    /// The record is rewritten only if `update` returns true.
    fn update_existing(
        &self,
        key: &str,
        update: &mut dyn FnMut(&mut Fields) -> bool,
    ) -> Result<bool, StoreError>;

    /// Returns true if a record was removed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Every key currently stored, in sorted order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Record keys double as file names in [`crate::FileStore`].
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
