// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests: a recipe directory with a small
//! catalog and a refreshed registry over it.

use crate::compose::{Composer, ComposerSettings, JobRequest, RecipeVars};
use crate::runner::RunnerConfig;
use prov_adapters::FakeApprovalClient;
use prov_core::VmId;
use prov_recipes::{RecipeRegistry, RecipeStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub(crate) fn metadata_yaml(name: &str, needs_approval: bool, versions: &[&str]) -> String {
    let versions: Vec<String> = versions.iter().map(|v| format!("\"{}\"", v)).collect();
    format!(
        "name: {name}\n\
         port: 8080\n\
         security_group_name: sg-{name}\n\
         security_group_description: access to {name}\n\
         security_group_ssh: false\n\
         direction: ingress\n\
         protocol: tcp\n\
         information_for_display: {{}}\n\
         needs_approval: {needs_approval}\n\
         versions: [{}]\n",
        versions.join(", ")
    )
}

pub(crate) fn write_recipe(
    dir: &Path,
    name: &str,
    needs_approval: bool,
    versions: &[&str],
    vars: Option<&str>,
) {
    std::fs::write(dir.join(format!("{}_metadata.yml", name)), metadata_yaml(name, needs_approval, versions))
        .unwrap();
    std::fs::write(dir.join(format!("{}.yml", name)), format!("- debug: msg={}\n", name)).unwrap();
    if let Some(vars) = vars {
        std::fs::write(dir.join(format!("{}_vars_file.yml", name)), vars).unwrap();
    }
}

pub(crate) struct Fixture {
    pub tmp: TempDir,
    pub registry: Arc<RecipeRegistry>,
}

impl Fixture {
    /// Catalog: `bioconda` (packages), `theia` (approved 1.0.0 and 1.1.0),
    /// `rstudio` (nothing approved), `guacamole` (no variables file).
    pub async fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let recipes = tmp.path().join("recipes");
        std::fs::create_dir_all(&recipes).unwrap();
        write_recipe(&recipes, "bioconda", false, &[], Some("bioconda_tools:\n  channels: [bioconda]\n"));
        write_recipe(&recipes, "theia", true, &["1.0.0", "1.1.0"], Some("theia_vars:\n  port: 8080\n"));
        write_recipe(&recipes, "rstudio", true, &["2.0.0"], Some("rstudio_vars: {}\n"));
        write_recipe(&recipes, "guacamole", false, &[], None);

        let approval = FakeApprovalClient::new().approve("theia", "1.0.0").approve("theia", "1.1.0");
        let registry = Arc::new(RecipeRegistry::new(RecipeStore::new(&recipes, None), Some(Arc::new(approval))));
        registry.refresh().await.unwrap();
        Self { tmp, registry }
    }

    pub fn recipes_dir(&self) -> PathBuf {
        self.tmp.path().join("recipes")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.tmp.path().join("jobs")
    }

    pub fn composer(&self) -> Composer {
        Composer::new(self.registry.clone(), ComposerSettings::new(self.jobs_dir()))
    }

    /// Number of job directories currently present.
    pub fn job_dir_count(&self) -> usize {
        match std::fs::read_dir(self.jobs_dir()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

pub(crate) fn request(vm_id: &str, recipes: &[(&str, RecipeVars)]) -> JobRequest {
    JobRequest {
        vm_id: VmId::new(vm_id),
        host: "192.168.1.10".to_string(),
        port: 30037,
        recipes: recipes.iter().map(|(name, vars)| (name.to_string(), vars.clone())).collect(),
        public_key: "ssh-ed25519 AAAAC3Nza user@example".to_string(),
        site: None,
    }
}

pub(crate) fn vars(pairs: &[(&str, serde_yaml::Value)]) -> RecipeVars {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// A runner that executes `script` through `sh -c`. The trailing
/// `-i <inventory> <definition>` arguments become positional parameters.
pub(crate) fn shell_runner(script: &str) -> RunnerConfig {
    RunnerConfig {
        program: "/bin/sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        env: Default::default(),
        stop_grace: Duration::from_secs(2),
    }
}

/// Poll `f` until it returns true or `timeout` elapses.
pub(crate) fn wait_until(timeout: Duration, mut f: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if f() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    f()
}
