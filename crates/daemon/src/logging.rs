// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File logging for the daemon.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleError;

const DEFAULT_FILTER: &str = "info";

/// Filter from `RUST_LOG`, falling back to `info` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber writing to `log_path`.
///
/// The returned guard flushes buffered lines on drop and must be held for
/// the life of the process.
pub fn init(log_path: &Path) -> Result<WorkerGuard, LifecycleError> {
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_path.file_name().unwrap_or_else(|| "provd.log".as_ref());
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;
    Ok(guard)
}
