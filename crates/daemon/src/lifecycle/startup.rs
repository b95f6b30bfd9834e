// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use prov_adapters::{build_client, ApprovalClient, HttpApprovalClient, HttpRecipeSource, RecipeSource};
use prov_engine::{reconcile_records, sweep_job_dirs, Composer, Provisioner};
use prov_recipes::{RecipeRegistry, RecipeStore};
use prov_storage::{FileStore, StateStore};
use tracing::{info, warn};

use super::{Daemon, LifecycleError};
use crate::config::Config;

/// Start the daemon
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    match startup_inner(config).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock:
            // the PID file belongs to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<Daemon, LifecycleError> {
    // 1. Create state directory (needed for lock)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Drop mutability

    // 3. Create directories
    std::fs::create_dir_all(&config.jobs_dir)?;
    std::fs::create_dir_all(&config.recipes_dir)?;

    // 4. Open the durable store; the daemon cannot run without it
    let store: Arc<dyn StateStore> = Arc::new(FileStore::open(&config.records_dir)?);

    // 5. Set up adapters
    let client = build_client(config.http_timeout)?;
    let source = config.listing_url.as_ref().map(|url| {
        info!(url = %url, "recipe source configured");
        Arc::new(HttpRecipeSource::new(client.clone(), url.clone())) as Arc<dyn RecipeSource>
    });
    let approval = match (&config.approval_url, &config.approval_api_key) {
        (Some(url), Some(key)) => {
            info!(url = %url, "approval service configured");
            Some(Arc::new(HttpApprovalClient::new(client, url.clone(), key.clone())) as Arc<dyn ApprovalClient>)
        }
        (Some(url), None) => {
            warn!(url = %url, "approval service configured without an API key, no versions will be approved");
            None
        }
        (None, _) => None,
    };

    // 6. Initial registry load. Best-effort: an empty catalog still serves
    let registry = Arc::new(RecipeRegistry::new(RecipeStore::new(&config.recipes_dir, source), approval));
    match registry.refresh().await {
        Ok(summary) => info!(
            loaded = summary.loaded,
            skipped = summary.skipped.len(),
            written = summary.store.written.len(),
            "loaded recipe catalog"
        ),
        Err(e) => warn!(error = %e, "initial recipe refresh failed"),
    }

    // 7. Reconcile jobs orphaned by a previous daemon, then sweep leftovers
    let report = reconcile_records(&*store, &config.jobs_dir)?;
    if !report.failed.is_empty() {
        warn!(
            failed = report.failed.len(),
            signalled = report.signalled.len(),
            "reconciled orphaned jobs"
        );
    }
    sweep_job_dirs(&config.jobs_dir);

    // 8. Create the provisioner
    let composer = Composer::new(Arc::clone(&registry), config.composer.clone());
    let provisioner = Arc::new(Provisioner::new(store, composer, config.runner.clone()));

    info!("Daemon started");

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        registry,
        provisioner,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
