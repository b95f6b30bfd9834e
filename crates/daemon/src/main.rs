// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `provd`: the provisioning daemon.

use std::process::ExitCode;

use prov_daemon::{logging, startup, wait_for_signal, Config, LifecycleError, Tasks};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("provd: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;
    let _log_guard = logging::init(&config.log_path)?;
    info!(version = env!("CARGO_PKG_VERSION"), state_dir = %config.state_dir.display(), "starting provd");

    let daemon = match startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "startup failed");
            return Err(e);
        }
    };
    let tasks = Tasks::spawn(&daemon);

    let waited = wait_for_signal().await;
    tasks.stop().await;
    daemon.shutdown_blocking().await;
    waited
}
