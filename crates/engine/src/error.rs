// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use prov_core::{ProvisioningState, VmId};
use prov_storage::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while assembling a job directory.
///
/// Per-recipe problems never surface here; they are recorded as degraded
/// fragments on the [`Job`](crate::Job).
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("failed to create job directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write private key: {0}")]
    PrivateKey(#[source] std::io::Error),

    #[error("failed to write {file}: {source}")]
    Write {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {file}: {source}")]
    Serialize {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid job template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to create log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid vm id: {0:?}")]
    InvalidVmId(VmId),

    #[error("vm {0} already has an active job")]
    AlreadyActive(VmId),

    #[error("no provisioning record for vm {0}")]
    NoRecord(VmId),

    #[error("provisioning record for vm {0} has no private key")]
    MissingKey(VmId),

    #[error("vm {vm_id} is not awaiting provisioning (state {state:?})")]
    NotPrepared {
        vm_id: VmId,
        state: Option<ProvisioningState>,
    },

    #[error("job for vm {0} is still starting")]
    Starting(VmId),

    #[error("job for vm {0} is still running")]
    StillRunning(VmId),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
