// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed views over the raw hash records.
//!
//! Layout:
//! - `<vm_id>`: `{ key, name, status }` plus `pid` and `job_dir` while a
//!   job is running
//! - `pb_logs_<vm_id>`: `{ returncode, stdout, stderr }` written on stop

use crate::store::{Fields, StateStore, StoreError};
use prov_core::{ExitCode, JobLogs, ProvisioningState, VmId};
use std::path::PathBuf;

pub const FIELD_KEY: &str = "key";
pub const FIELD_NAME: &str = "name";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_PID: &str = "pid";
pub const FIELD_JOB_DIR: &str = "job_dir";

pub const FIELD_RETURNCODE: &str = "returncode";
pub const FIELD_STDOUT: &str = "stdout";
pub const FIELD_STDERR: &str = "stderr";

const LOGS_PREFIX: &str = "pb_logs_";

/// Key of the side record holding logs of a stopped job.
pub fn logs_key(vm_id: &VmId) -> String {
    format!("{}{}", LOGS_PREFIX, vm_id)
}

/// Whether `key` names a side logs record rather than a provisioning record.
pub fn is_logs_key(key: &str) -> bool {
    key.starts_with(LOGS_PREFIX)
}

/// Durable provisioning record of one VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRecord {
    pub private_key: String,
    pub name: String,
    /// `None` if the stored status text is missing or unrecognized.
    pub status: Option<ProvisioningState>,
    pub pid: Option<u32>,
    pub job_dir: Option<PathBuf>,
}

impl ProvisioningRecord {
    fn from_fields(mut fields: Fields) -> Self {
        Self {
            private_key: fields.remove(FIELD_KEY).unwrap_or_default(),
            name: fields.remove(FIELD_NAME).unwrap_or_default(),
            status: fields.remove(FIELD_STATUS).and_then(|s| s.parse().ok()),
            pid: fields.remove(FIELD_PID).and_then(|s| s.parse().ok()),
            job_dir: fields.remove(FIELD_JOB_DIR).filter(|s| !s.is_empty()).map(PathBuf::from),
        }
    }

    /// Seed a fresh record in `PREPARE_BUILD`.
    pub fn create(
        store: &dyn StateStore,
        vm_id: &VmId,
        private_key: &str,
        name: &str,
    ) -> Result<(), StoreError> {
        let fields = Fields::from([
            (FIELD_KEY.to_string(), private_key.to_string()),
            (FIELD_NAME.to_string(), name.to_string()),
            (FIELD_STATUS.to_string(), ProvisioningState::PrepareBuild.to_string()),
        ]);
        store.set_fields(vm_id, &fields)
    }

    pub fn load(store: &dyn StateStore, vm_id: &VmId) -> Result<Option<Self>, StoreError> {
        Ok(store.get_all(vm_id)?.map(Self::from_fields))
    }

    pub fn state(store: &dyn StateStore, vm_id: &VmId) -> Result<Option<ProvisioningState>, StoreError> {
        Ok(store.get_field(vm_id, FIELD_STATUS)?.and_then(|s| s.parse().ok()))
    }

    /// Advance the stored state, refusing backward moves.
    ///
    /// Returns `Ok(false)` without writing when the record is missing or the
    /// transition is not forward. The check and the write happen under the
    /// store's lock, so a record deleted concurrently is never recreated.
    pub fn advance(
        store: &dyn StateStore,
        vm_id: &VmId,
        next: ProvisioningState,
    ) -> Result<bool, StoreError> {
        let mut accepted = false;
        let existed = store.update_existing(vm_id, &mut |fields| {
            let current = fields.get(FIELD_STATUS).and_then(|s| s.parse::<ProvisioningState>().ok());
            match current {
                Some(current) if !current.can_advance_to(next) => {
                    tracing::debug!(vm_id = %vm_id, %current, %next, "refusing backward state transition");
                    false
                }
                Some(current) if current == next => {
                    accepted = true;
                    false
                }
                _ => {
                    fields.insert(FIELD_STATUS.to_string(), next.to_string());
                    accepted = true;
                    true
                }
            }
        })?;
        Ok(existed && accepted)
    }

    /// Record the running child so a restarted daemon can find it.
    pub fn attach_job(
        store: &dyn StateStore,
        vm_id: &VmId,
        pid: Option<u32>,
        job_dir: &std::path::Path,
    ) -> Result<(), StoreError> {
        let fields = Fields::from([
            (FIELD_PID.to_string(), pid.map(|p| p.to_string()).unwrap_or_default()),
            (FIELD_JOB_DIR.to_string(), job_dir.display().to_string()),
        ]);
        store.set_fields(vm_id, &fields)
    }

    pub fn delete(store: &dyn StateStore, vm_id: &VmId) -> Result<bool, StoreError> {
        store.delete(vm_id)
    }
}

/// Logs of a stopped job persisted under [`logs_key`].
pub struct StoredLogs;

impl StoredLogs {
    pub fn save(store: &dyn StateStore, vm_id: &VmId, logs: &JobLogs) -> Result<(), StoreError> {
        let fields = Fields::from([
            (FIELD_RETURNCODE.to_string(), logs.exit_code.to_string()),
            (FIELD_STDOUT.to_string(), logs.stdout.clone()),
            (FIELD_STDERR.to_string(), logs.stderr.clone()),
        ]);
        store.set_fields(&logs_key(vm_id), &fields)
    }

    pub fn delete(store: &dyn StateStore, vm_id: &VmId) -> Result<bool, StoreError> {
        store.delete(&logs_key(vm_id))
    }

    pub fn load(store: &dyn StateStore, vm_id: &VmId) -> Result<Option<JobLogs>, StoreError> {
        let Some(mut fields) = store.get_all(&logs_key(vm_id))? else {
            return Ok(None);
        };
        Ok(Some(JobLogs {
            exit_code: fields
                .remove(FIELD_RETURNCODE)
                .and_then(|s| s.parse::<ExitCode>().ok())
                .unwrap_or_default(),
            stdout: fields.remove(FIELD_STDOUT).unwrap_or_default(),
            stderr: fields.remove(FIELD_STDERR).unwrap_or_default(),
        }))
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
