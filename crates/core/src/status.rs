// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status and captured log values.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Liveness of a provisioning job as observed by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

crate::simple_display! {
    JobStatus {
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Exit code of the automation runner.
///
/// `Unknown` is the sentinel for "no job known" and for children whose
/// exit status could not be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExitCode {
    Code(i32),
    #[default]
    Unknown,
}

impl ExitCode {
    pub fn code(self) -> Option<i32> {
        match self {
            Self::Code(c) => Some(c),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(c) => write!(f, "{}", c),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl FromStr for ExitCode {
    type Err = std::convert::Infallible;

    /// Anything that is not an integer reads back as `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.trim().parse::<i32>().map(Self::Code).unwrap_or(Self::Unknown))
    }
}

impl From<Option<i32>> for ExitCode {
    fn from(code: Option<i32>) -> Self {
        code.map(Self::Code).unwrap_or(Self::Unknown)
    }
}

/// Captured output of a finished (or stopped) job.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobLogs {
    pub exit_code: ExitCode,
    pub stdout: String,
    pub stderr: String,
}

impl JobLogs {
    /// Sentinel returned when no job is known for a VM.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.exit_code == ExitCode::Unknown && self.stdout.is_empty() && self.stderr.is_empty()
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
