// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Out-of-process execution of a composed job.
//!
//! The runner is spawned as the leader of its own process group, so stop
//! signals reach every helper it forked.

use crate::compose::{remove_dir_logged, Job, STDERR_LOG, STDOUT_LOG};
use crate::error::LaunchError;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use prov_core::{ExitCode, JobLogs, JobStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How to invoke the external automation runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub program: String,
    /// Arguments placed before `-i <inventory> <definition>`.
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    /// Time between SIGTERM and SIGKILL on stop.
    #[serde(with = "duration_secs")]
    pub stop_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "ansible-playbook".to_string(),
            args: vec!["-v".to_string()],
            env: BTreeMap::from([("ANSIBLE_HOST_KEY_CHECKING".to_string(), "False".to_string())]),
            stop_grace: Duration::from_secs(5),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

/// A running (or finished) job process.
#[derive(Debug)]
pub struct JobRunner {
    job: Job,
    child: Child,
    exit: Option<ExitCode>,
}

impl JobRunner {
    /// Spawn the runner for `job` without waiting for it.
    pub fn start(job: Job, config: &RunnerConfig) -> Result<Self, LaunchError> {
        let stdout = create_log(&job.stdout_path())?;
        let stderr = create_log(&job.stderr_path())?;
        let child = Command::new(&config.program)
            .args(&config.args)
            .arg("-i")
            .arg(job.inventory_path())
            .arg(job.definition_path())
            .envs(&config.env)
            .current_dir(&job.dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()
            .map_err(|source| LaunchError::Spawn { program: config.program.clone(), source })?;
        tracing::info!(vm_id = %job.vm_id, pid = child.id(), dir = %job.dir.display(), "started job");
        Ok(Self { job, child, exit: None })
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Non-blocking status check. Once terminal, the result is cached.
    pub fn poll(&mut self) -> JobStatus {
        if self.exit.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => self.record_exit(status),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(vm_id = %self.job.vm_id, error = %e, "failed to poll job, treating as failed");
                    self.exit = Some(ExitCode::Unknown);
                }
            }
        }
        match self.exit {
            None => JobStatus::Running,
            Some(ExitCode::Code(0)) => JobStatus::Succeeded,
            Some(_) => JobStatus::Failed,
        }
    }

    /// Exit code, `Unknown` while running.
    pub fn exit_code(&self) -> ExitCode {
        self.exit.unwrap_or_default()
    }

    /// SIGTERM the process group, wait up to `grace`, then SIGKILL.
    /// Terminating an exited child is a no-op.
    pub fn terminate(&mut self, grace: Duration) {
        if self.poll().is_terminal() {
            return;
        }
        tracing::info!(vm_id = %self.job.vm_id, pid = self.pid(), "stopping job");
        signal_group(self.pid(), Signal::SIGTERM);

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if self.poll().is_terminal() {
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        tracing::warn!(vm_id = %self.job.vm_id, pid = self.pid(), "job ignored SIGTERM, killing");
        signal_group(self.pid(), Signal::SIGKILL);
        match self.child.wait() {
            Ok(status) => self.record_exit(status),
            Err(e) => {
                tracing::warn!(vm_id = %self.job.vm_id, error = %e, "failed to reap killed job");
                self.exit = Some(ExitCode::Unknown);
            }
        }
    }

    /// Exit code plus the full contents of both log files.
    pub fn collect_logs(&self) -> JobLogs {
        let (stdout, stderr) = read_log_pair(&self.job.dir);
        JobLogs { exit_code: self.exit_code(), stdout, stderr }
    }

    /// Remove the job directory.
    pub fn cleanup(self) {
        remove_dir_logged(&self.job.dir);
    }

    fn record_exit(&mut self, status: ExitStatus) {
        let code = exit_code_of(status);
        tracing::info!(vm_id = %self.job.vm_id, exit_code = %code, "job exited");
        self.exit = Some(code);
    }
}

/// Signal-terminated children report `128 + signal`.
pub fn exit_code_of(status: ExitStatus) -> ExitCode {
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitCode::Code(code),
        (None, Some(signal)) => ExitCode::Code(128 + signal),
        (None, None) => ExitCode::Unknown,
    }
}

/// Deliver `signal` to the process group led by `pid`.
///
/// Returns false when the group no longer exists.
pub fn signal_group(pid: u32, signal: Signal) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(e) => {
            tracing::warn!(pid, %signal, error = %e, "failed to signal job");
            false
        }
    }
}

/// Read both log files of a job directory. Missing files read as empty.
pub fn read_log_pair(dir: &Path) -> (String, String) {
    (read_log(&dir.join(STDOUT_LOG)), read_log(&dir.join(STDERR_LOG)))
}

fn read_log(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "failed to read job log");
            }
            String::new()
        }
    }
}

fn create_log(path: &Path) -> Result<File, LaunchError> {
    File::create(path).map_err(|source| LaunchError::LogFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
