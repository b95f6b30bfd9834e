// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background loops: periodic recipe refresh and the job status monitor.
//!
//! Both loops skip the immediate first tick (startup already refreshed and
//! no job can be running yet) and exit when the shutdown channel flips.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use prov_core::{JobStatus, VmId};
use prov_engine::Provisioner;
use prov_recipes::RecipeRegistry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::lifecycle::Daemon;

/// Handles of the running background loops.
pub struct Tasks {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Tasks {
    pub fn spawn(daemon: &Daemon) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let mut handles = vec![tokio::spawn(monitor_loop(
            Arc::clone(&daemon.provisioner),
            daemon.config.monitor_interval,
            rx.clone(),
        ))];
        handles.push(tokio::spawn(refresh_loop(
            Arc::clone(&daemon.registry),
            daemon.config.refresh_interval,
            rx,
        )));
        Self { shutdown, handles }
    }

    /// Signal every loop and wait for it to finish its current iteration.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task panicked");
            }
        }
    }
}

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Re-sync the recipe store and rebuild the registry every `period`.
pub async fn refresh_loop(registry: Arc<RecipeRegistry>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = ticker(period);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        match registry.refresh().await {
            Ok(summary) => debug!(loaded = summary.loaded, written = summary.store.written.len(), "periodic recipe refresh"),
            Err(e) => warn!(error = %e, "periodic recipe refresh failed"),
        }
    }
    debug!("recipe refresh loop stopped");
}

/// Poll every active job so terminal states reach the store without a
/// caller asking. Each finished job is reported once.
pub async fn monitor_loop(provisioner: Arc<Provisioner>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = ticker(period);
    let mut finished: HashSet<VmId> = HashSet::new();
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        let polled = provisioner.poll_all();
        finished.retain(|id| polled.iter().any(|(vm_id, _)| vm_id == id));
        for (vm_id, status) in polled {
            if status != JobStatus::Running && finished.insert(vm_id.clone()) {
                info!(vm_id = %vm_id, %status, "job finished");
            }
        }
    }
    debug!("job monitor loop stopped");
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
