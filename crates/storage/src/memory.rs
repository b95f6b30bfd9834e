// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory state store for tests.

use crate::store::{validate_key, Fields, StateStore, StoreError};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Fields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get_field(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.records.lock().get(key).and_then(|f| f.get(field).cloned()))
    }

    fn get_all(&self, key: &str) -> Result<Option<Fields>, StoreError> {
        validate_key(key)?;
        Ok(self.records.lock().get(key).cloned())
    }

    fn set_fields(&self, key: &str, fields: &Fields) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut records = self.records.lock();
        let record = records.entry(key.to_string()).or_default();
        record.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn update_existing(
        &self,
        key: &str,
        update: &mut dyn FnMut(&mut Fields) -> bool,
    ) -> Result<bool, StoreError> {
        validate_key(key)?;
        let mut records = self.records.lock();
        let Some(record) = records.get_mut(key) else {
            return Ok(false);
        };
        let mut fields = record.clone();
        if update(&mut fields) {
            *record = fields;
        }
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.records.lock().remove(key).is_some())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.records.lock().contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records.lock().keys().cloned().collect())
    }
}
