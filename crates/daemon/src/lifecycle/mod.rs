// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use prov_adapters::AdapterError;
use prov_core::{GatewayError, VmId};
use prov_engine::{JobRequest, Provisioner};
use prov_recipes::RecipeRegistry;
use prov_storage::StoreError;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::config::Config;

/// Daemon state during operation.
pub struct Daemon {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub registry: Arc<RecipeRegistry>,
    pub provisioner: Arc<Provisioner>,
    pub start_time: Instant,
}

impl Daemon {
    /// A request addressing the VM through the configured gateway.
    pub fn gateway_request(
        &self,
        vm_id: VmId,
        private_address: &str,
        public_key: &str,
    ) -> Result<JobRequest, GatewayError> {
        JobRequest::through_gateway(
            vm_id,
            &self.config.gateway_host,
            private_address,
            &self.config.gateway,
            public_key,
        )
    }

    /// Stop every active job and release the PID file.
    ///
    /// Stopped jobs keep their logs under `pb_logs_<id>`; the next startup
    /// finds no `BUILD_RUNNING` records for them.
    pub fn shutdown(&self) {
        info!(uptime_secs = self.start_time.elapsed().as_secs(), "Shutting down daemon...");

        self.provisioner.shutdown();

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // Lock file is released when self.lock_file is dropped
        info!("Daemon shutdown complete");
    }

    /// [`Daemon::shutdown`] on the blocking pool. Stopping a job waits out
    /// its grace period, which must not stall the runtime.
    pub async fn shutdown_blocking(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.shutdown()).await {
            warn!(error = %e, "shutdown task failed");
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid gateway settings: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] AdapterError),

    #[error("Failed to install logger: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolve once SIGTERM or SIGINT arrives.
pub async fn wait_for_signal() -> Result<(), LifecycleError> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
    Ok(())
}
