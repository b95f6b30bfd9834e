// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed state store.
//!
//! One JSON document per record key under `<root>/<key>.json`. Writes go to
//! a temp file that is fsynced and renamed over the target, so a crash
//! leaves either the old or the new record, never a torn one.

use crate::store::{validate_key, Fields, StateStore, StoreError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current record schema version
const RECORD_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    #[serde(rename = "v")]
    version: u32,
    updated_at: DateTime<Utc>,
    fields: Fields,
}

pub struct FileStore {
    root: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// Probes writability so an unusable directory is reported at startup
    /// rather than on the first provisioning request.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let unavailable = |source| StoreError::Unavailable { path: root.clone(), source };
        fs::create_dir_all(&root).map_err(unavailable)?;
        let probe = root.join(".probe");
        fs::write(&probe, b"ok").map_err(unavailable)?;
        fs::remove_file(&probe).map_err(unavailable)?;
        Ok(Self { root, write_lock: Mutex::new(()) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.json", key)))
    }

    fn read(&self, key: &str) -> Result<Option<Fields>, StoreError> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: RecordFile = serde_json::from_slice(&bytes)
            .map_err(|source| StoreError::Corrupt { key: key.to_string(), source })?;
        Ok(Some(record.fields))
    }

    fn write(&self, key: &str, fields: Fields) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let record = RecordFile { version: RECORD_VERSION, updated_at: Utc::now(), fields };
        let bytes = serde_json::to_vec(&record)?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get_field(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read(key)?.and_then(|mut fields| fields.remove(field)))
    }

    fn get_all(&self, key: &str) -> Result<Option<Fields>, StoreError> {
        self.read(key)
    }

    fn set_fields(&self, key: &str, fields: &Fields) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut merged = self.read(key)?.unwrap_or_default();
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.write(key, merged)
    }

    fn update_existing(
        &self,
        key: &str,
        update: &mut dyn FnMut(&mut Fields) -> bool,
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let Some(mut fields) = self.read(key)? else {
            return Ok(false);
        };
        if update(&mut fields) {
            self.write(key, fields)?;
        }
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock();
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key)?.exists())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(".json") {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
