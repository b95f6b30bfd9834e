// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::{Path, PathBuf};

use crate::lifecycle::LifecycleError;

/// Resolve state directory: PROV_STATE_DIR > XDG_STATE_HOME/prov > ~/.local/state/prov
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("PROV_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("prov"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/prov"))
}

/// Config file set explicitly via `PROV_CONFIG`.
pub fn explicit_config_path() -> Option<PathBuf> {
    std::env::var("PROV_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Config file looked up when `PROV_CONFIG` is unset.
pub fn default_config_path(state_dir: &Path) -> PathBuf {
    state_dir.join("provd.toml")
}

/// Approval service API key, overriding the config file.
pub fn approval_api_key() -> Option<String> {
    std::env::var("PROV_APPROVAL_API_KEY").ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
