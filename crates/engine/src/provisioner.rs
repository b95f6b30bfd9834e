// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning facade: ties the durable state machine to the jobs this
//! process owns.
//!
//! Lifecycle of one VM:
//!
//! ```text
//! prepare ──▶ PREPARE_BUILD ──start──▶ BUILD_RUNNING ──exit 0──▶ ACTIVE
//!                                            │
//!                                            └──exit ≠ 0──▶ BUILD_FAILED
//! ```
//!
//! `logs` drains a finished job and deletes its record. `stop` terminates
//! a job, persists its logs under `pb_logs_<id>` and deletes the record.

use crate::active::ActiveJobs;
use crate::compose::{remove_dir_logged, Composer, JobRequest};
use crate::error::ProvisionError;
use crate::runner::{JobRunner, RunnerConfig};
use prov_core::{JobLogs, JobStatus, ProvisioningState, VmId};
use prov_storage::{ProvisioningRecord, StateStore, StoreError, StoredLogs};
use std::sync::Arc;

pub struct Provisioner {
    store: Arc<dyn StateStore>,
    composer: Composer,
    runner: RunnerConfig,
    active: ActiveJobs,
}

impl Provisioner {
    pub fn new(store: Arc<dyn StateStore>, composer: Composer, runner: RunnerConfig) -> Self {
        Self { store, composer, runner, active: ActiveJobs::new() }
    }

    pub fn store(&self) -> &dyn StateStore {
        &*self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn active(&self) -> &ActiveJobs {
        &self.active
    }

    /// Seed a fresh `PREPARE_BUILD` record, replacing any leftover record
    /// and persisted logs for the same id.
    pub fn prepare(&self, vm_id: &VmId, private_key: &str, name: &str) -> Result<(), ProvisionError> {
        check_id(vm_id)?;
        if self.active.contains(vm_id) {
            return Err(ProvisionError::AlreadyActive(vm_id.clone()));
        }
        ProvisioningRecord::delete(self.store(), vm_id)?;
        StoredLogs::delete(self.store(), vm_id)?;
        ProvisioningRecord::create(self.store(), vm_id, private_key, name)?;
        tracing::info!(vm_id = %vm_id, name, "prepared provisioning record");
        Ok(())
    }

    /// Compose and launch the job for a prepared VM.
    ///
    /// At most one job per VM id; the slot is reserved before composing and
    /// released again if anything fails.
    pub fn start_provisioning(&self, request: &JobRequest) -> Result<(), ProvisionError> {
        let vm_id = &request.vm_id;
        check_id(vm_id)?;
        let Some(reservation) = self.active.reserve(vm_id) else {
            return Err(ProvisionError::AlreadyActive(vm_id.clone()));
        };

        let record = ProvisioningRecord::load(self.store(), vm_id)?
            .ok_or_else(|| ProvisionError::NoRecord(vm_id.clone()))?;
        if record.status != Some(ProvisioningState::PrepareBuild) {
            return Err(ProvisionError::NotPrepared { vm_id: vm_id.clone(), state: record.status });
        }
        if record.private_key.is_empty() {
            return Err(ProvisionError::MissingKey(vm_id.clone()));
        }

        let job = self.composer.compose(request, &record.private_key)?;
        let dir = job.dir.clone();
        let mut runner = JobRunner::start(job, &self.runner).inspect_err(|_| remove_dir_logged(&dir))?;

        if let Err(e) = self.mark_running(vm_id, &runner) {
            tracing::warn!(vm_id = %vm_id, error = %e, "failed to record running job, stopping it");
            runner.terminate(self.runner.stop_grace);
            runner.cleanup();
            return Err(e.into());
        }
        reservation.commit(runner);
        Ok(())
    }

    fn mark_running(&self, vm_id: &VmId, runner: &JobRunner) -> Result<(), StoreError> {
        ProvisioningRecord::advance(self.store(), vm_id, ProvisioningState::BuildRunning)?;
        ProvisioningRecord::attach_job(self.store(), vm_id, Some(runner.pid()), &runner.job().dir)
    }

    /// Probe the active job for `vm_id` and persist a terminal outcome.
    ///
    /// `None` when this process owns no running job for the id.
    pub fn poll_status(&self, vm_id: &VmId) -> Result<Option<JobStatus>, ProvisionError> {
        let Some(status) = self.active.with_runner(vm_id, |runner| runner.poll()) else {
            return Ok(None);
        };
        let next = match status {
            JobStatus::Running => return Ok(Some(status)),
            JobStatus::Succeeded => ProvisioningState::Active,
            JobStatus::Failed => ProvisioningState::BuildFailed,
        };
        if !ProvisioningRecord::advance(self.store(), vm_id, next)? {
            tracing::debug!(vm_id = %vm_id, %next, "state not advanced");
        }
        Ok(Some(status))
    }

    /// Current durable state, refreshed from the active job first.
    pub fn status(&self, vm_id: &VmId) -> Result<Option<ProvisioningState>, ProvisionError> {
        self.poll_status(vm_id)?;
        Ok(ProvisioningRecord::state(self.store(), vm_id)?)
    }

    /// Poll every running job. Store errors are logged and skipped.
    pub fn poll_all(&self) -> Vec<(VmId, JobStatus)> {
        let mut polled = Vec::new();
        for vm_id in self.active.running_ids() {
            match self.poll_status(&vm_id) {
                Ok(Some(status)) => polled.push((vm_id, status)),
                Ok(None) => {}
                Err(e) => tracing::warn!(vm_id = %vm_id, error = %e, "failed to poll job"),
            }
        }
        polled
    }

    /// Logs of a finished job.
    ///
    /// A finished active job is drained: its directory and record are
    /// removed. Otherwise persisted logs from a stop are returned, and an
    /// unknown sentinel when nothing is known.
    pub fn logs(&self, vm_id: &VmId) -> Result<JobLogs, ProvisionError> {
        if let Some(status) = self.poll_status(vm_id)? {
            if status == JobStatus::Running {
                return Err(ProvisionError::StillRunning(vm_id.clone()));
            }
            if let Some(runner) = self.active.take(vm_id) {
                let logs = runner.collect_logs();
                runner.cleanup();
                ProvisioningRecord::delete(self.store(), vm_id)?;
                tracing::info!(vm_id = %vm_id, exit_code = %logs.exit_code, "collected job logs");
                return Ok(logs);
            }
        }
        Ok(StoredLogs::load(self.store(), vm_id)?.unwrap_or_else(JobLogs::unknown))
    }

    /// Remove the job directory and durable record, terminating a job that
    /// is still running.
    pub fn cleanup(&self, vm_id: &VmId) -> Result<(), ProvisionError> {
        match self.active.take(vm_id) {
            Some(mut runner) => {
                runner.terminate(self.runner.stop_grace);
                runner.cleanup();
            }
            None => self.remove_recorded_dir(vm_id)?,
        }
        ProvisioningRecord::delete(self.store(), vm_id)?;
        Ok(())
    }

    /// Terminate the job, persist its logs under `pb_logs_<id>` and clean
    /// up. On return the directory and the record are gone.
    pub fn stop(&self, vm_id: &VmId) -> Result<JobLogs, ProvisionError> {
        if let Some(runner) = self.active.take(vm_id) {
            return self.stop_runner(vm_id, runner);
        }
        if self.active.contains(vm_id) {
            return Err(ProvisionError::Starting(vm_id.clone()));
        }
        self.remove_recorded_dir(vm_id)?;
        ProvisioningRecord::delete(self.store(), vm_id)?;
        Ok(StoredLogs::load(self.store(), vm_id)?.unwrap_or_else(JobLogs::unknown))
    }

    fn stop_runner(&self, vm_id: &VmId, mut runner: JobRunner) -> Result<JobLogs, ProvisionError> {
        runner.terminate(self.runner.stop_grace);
        let logs = runner.collect_logs();
        let saved = StoredLogs::save(self.store(), vm_id, &logs);
        runner.cleanup();
        let deleted = ProvisioningRecord::delete(self.store(), vm_id);
        saved?;
        deleted?;
        tracing::info!(vm_id = %vm_id, exit_code = %logs.exit_code, "stopped job");
        Ok(logs)
    }

    /// Stop every active job. Failures are logged.
    pub fn shutdown(&self) {
        let runners = self.active.drain();
        if !runners.is_empty() {
            tracing::info!(count = runners.len(), "stopping active jobs");
        }
        for runner in runners {
            let vm_id = runner.job().vm_id.clone();
            if let Err(e) = self.stop_runner(&vm_id, runner) {
                tracing::warn!(vm_id = %vm_id, error = %e, "failed to stop job on shutdown");
            }
        }
    }

    fn remove_recorded_dir(&self, vm_id: &VmId) -> Result<(), StoreError> {
        let Some(dir) = ProvisioningRecord::load(self.store(), vm_id)?.and_then(|r| r.job_dir) else {
            return Ok(());
        };
        if dir.starts_with(&self.composer.settings().jobs_dir) {
            remove_dir_logged(&dir);
        } else {
            tracing::warn!(vm_id = %vm_id, dir = %dir.display(), "recorded job directory outside jobs dir, leaving it");
        }
        Ok(())
    }
}

fn check_id(vm_id: &VmId) -> Result<(), ProvisionError> {
    if vm_id.is_valid() {
        Ok(())
    } else {
        Err(ProvisionError::InvalidVmId(vm_id.clone()))
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
