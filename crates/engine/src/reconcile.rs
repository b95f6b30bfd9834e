// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup reconciliation of jobs left behind by a previous daemon.
//!
//! A fresh process owns no jobs, so every `BUILD_RUNNING` record is an
//! orphan: its child (if still alive) is signalled, whatever logs remain
//! are persisted and the record is marked `BUILD_FAILED`.

use crate::compose::remove_dir_logged;
use crate::runner::{read_log_pair, signal_group};
use nix::sys::signal::Signal;
use prov_core::{JobLogs, ProvisioningState, VmId};
use prov_storage::{records, ProvisioningRecord, StateStore, StoreError, StoredLogs};
use std::path::Path;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records moved to `BUILD_FAILED`.
    pub failed: Vec<VmId>,
    /// Orphans whose process group was still alive and got SIGTERM.
    pub signalled: Vec<VmId>,
}

pub fn reconcile_records(store: &dyn StateStore, jobs_dir: &Path) -> Result<ReconcileReport, StoreError> {
    let mut report = ReconcileReport::default();
    for key in store.keys()? {
        if records::is_logs_key(&key) {
            continue;
        }
        let vm_id = VmId::new(key);
        let Some(record) = ProvisioningRecord::load(store, &vm_id)? else {
            continue;
        };
        if record.status != Some(ProvisioningState::BuildRunning) {
            continue;
        }

        let job_dir = record.job_dir.as_deref().filter(|dir| dir.starts_with(jobs_dir));
        if let (Some(pid), Some(dir)) = (record.pid, job_dir) {
            if still_runs_in(pid, dir) && signal_group(pid, Signal::SIGTERM) {
                report.signalled.push(vm_id.clone());
            }
        }

        let mut logs = JobLogs::unknown();
        if let Some(dir) = job_dir {
            (logs.stdout, logs.stderr) = read_log_pair(dir);
            remove_dir_logged(dir);
        }
        StoredLogs::save(store, &vm_id, &logs)?;
        ProvisioningRecord::advance(store, &vm_id, ProvisioningState::BuildFailed)?;
        tracing::warn!(vm_id = %vm_id, pid = ?record.pid, "orphaned job marked failed");
        report.failed.push(vm_id);
    }
    Ok(report)
}

/// Whether `pid` is still alive with `dir` as its working directory.
/// Guards against signalling an unrelated process that reused the pid.
fn still_runs_in(pid: u32, dir: &Path) -> bool {
    match std::fs::read_link(format!("/proc/{}/cwd", pid)) {
        Ok(cwd) => cwd == dir || std::fs::canonicalize(dir).is_ok_and(|d| d == cwd),
        Err(_) => false,
    }
}

/// Remove every entry under `jobs_dir`. Only valid while no job is
/// active. Returns the number of entries removed.
pub fn sweep_job_dirs(jobs_dir: &Path) -> usize {
    let entries = match std::fs::read_dir(jobs_dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(dir = %jobs_dir.display(), error = %e, "failed to list jobs directory");
            }
            return 0;
        }
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let result = if path.is_dir() { std::fs::remove_dir_all(&path) } else { std::fs::remove_file(&path) };
        match result {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove stale job entry"),
        }
    }
    if removed > 0 {
        tracing::info!(removed, "swept stale job directories");
    }
    removed
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
