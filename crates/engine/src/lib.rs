// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Provisioning engine: job composition, out-of-process execution and
//! the durable provisioning state machine.

mod active;
pub mod compose;
mod error;
mod provisioner;
pub mod reconcile;
pub mod runner;

#[cfg(test)]
mod test_helpers;

pub use active::{ActiveJobs, Reservation};
pub use compose::{Composer, ComposerSettings, Degradation, DegradedFragment, Job, JobRequest, RecipeVars};
pub use error::{ComposeError, LaunchError, ProvisionError};
pub use provisioner::Provisioner;
pub use reconcile::{reconcile_records, sweep_job_dirs, ReconcileReport};
pub use runner::{JobRunner, RunnerConfig};
