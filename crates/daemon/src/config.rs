// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: an optional TOML file layered over defaults,
//! resolved against the state directory.
//!
//! ```toml
//! [gateway]
//! host = "gateway.example.org"
//! base_port = 30000
//! ssh_multiplier = 3
//! udp_multiplier = 10
//!
//! [recipes]
//! listing_url = "https://recipes.example.org/index.json"
//! refresh_interval_secs = 300
//!
//! [approval]
//! url = "https://approval.example.org/templates"
//!
//! [runner]
//! program = "ansible-playbook"
//! stop_grace = 5
//!
//! [monitor]
//! interval_secs = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use prov_core::GatewayPorts;
use prov_engine::{ComposerSettings, RunnerConfig};
use serde::Deserialize;

use crate::env;
use crate::lifecycle::LifecycleError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySection {
    pub host: String,
    pub base_port: u16,
    pub ssh_multiplier: u16,
    pub udp_multiplier: u16,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self { host: "localhost".to_string(), base_port: 30000, ssh_multiplier: 1, udp_multiplier: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecipesSection {
    /// Local recipe directory, default `<state_dir>/recipes`
    pub dir: Option<PathBuf>,
    /// Remote listing; refresh from remote is disabled when unset
    pub listing_url: Option<String>,
    pub refresh_interval_secs: u64,
}

impl Default for RecipesSection {
    fn default() -> Self {
        Self { dir: None, listing_url: None, refresh_interval_secs: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApprovalSection {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApprovalSection {
    fn default() -> Self {
        Self { url: None, api_key: None, timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunnerSection {
    pub remote_user: String,
    pub interpreter: String,
    #[serde(flatten)]
    pub process: RunnerConfig,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            remote_user: "ubuntu".to_string(),
            interpreter: "/usr/bin/python3".to_string(),
            process: RunnerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSection {
    pub interval_secs: u64,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

/// Contents of `provd.toml`. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub gateway: GatewaySection,
    pub recipes: RecipesSection,
    pub approval: ApprovalSection,
    pub runner: RunnerSection,
    pub monitor: MonitorSection,
}

impl ConfigFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self, LifecycleError> {
        toml::from_str(content)
            .map_err(|source| LifecycleError::ConfigParse { path: path.to_path_buf(), source })
    }

    /// Read `path`; a missing file yields defaults unless `required`.
    pub fn read(path: &Path, required: bool) -> Result<Self, LifecycleError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(LifecycleError::ConfigRead { path: path.to_path_buf(), source }),
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/prov)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Durable provisioning records
    pub records_dir: PathBuf,
    /// Parent of per-job working directories
    pub jobs_dir: PathBuf,
    pub recipes_dir: PathBuf,
    pub gateway_host: String,
    pub gateway: GatewayPorts,
    pub listing_url: Option<String>,
    pub refresh_interval: Duration,
    pub approval_url: Option<String>,
    pub approval_api_key: Option<String>,
    pub http_timeout: Duration,
    pub composer: ComposerSettings,
    pub runner: RunnerConfig,
    pub monitor_interval: Duration,
}

impl Config {
    /// Load configuration from the environment and the optional config file.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let file = match env::explicit_config_path() {
            Some(path) => ConfigFile::read(&path, true)?,
            None => ConfigFile::read(&env::default_config_path(&state_dir), false)?,
        };
        let mut config = Self::resolve(state_dir, file)?;
        if let Some(key) = env::approval_api_key() {
            config.approval_api_key = Some(key);
        }
        Ok(config)
    }

    /// Apply a parsed config file to a state directory.
    pub fn resolve(state_dir: PathBuf, file: ConfigFile) -> Result<Self, LifecycleError> {
        let gateway = GatewayPorts::new(
            file.gateway.base_port,
            file.gateway.ssh_multiplier,
            file.gateway.udp_multiplier,
        )?;
        let jobs_dir = state_dir.join("jobs");
        let composer = ComposerSettings {
            jobs_dir: jobs_dir.clone(),
            remote_user: file.runner.remote_user,
            interpreter: file.runner.interpreter,
        };
        Ok(Self {
            lock_path: state_dir.join("provd.pid"),
            log_path: state_dir.join("provd.log"),
            records_dir: state_dir.join("records"),
            recipes_dir: file.recipes.dir.unwrap_or_else(|| state_dir.join("recipes")),
            jobs_dir,
            gateway_host: file.gateway.host,
            gateway,
            listing_url: file.recipes.listing_url.filter(|u| !u.is_empty()),
            refresh_interval: interval_secs(file.recipes.refresh_interval_secs),
            approval_url: file.approval.url.filter(|u| !u.is_empty()),
            approval_api_key: file.approval.api_key.filter(|k| !k.is_empty()),
            http_timeout: interval_secs(file.approval.timeout_secs),
            composer,
            runner: file.runner.process,
            monitor_interval: interval_secs(file.monitor.interval_secs),
            state_dir,
        })
    }
}

/// Zero would spin; clamp to one second.
fn interval_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
