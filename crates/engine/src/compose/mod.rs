// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job composition: turn a [`JobRequest`] into a self-contained job
//! directory the external runner can execute.

pub mod definition;
pub mod inject;

use crate::error::ComposeError;
use definition::{inventory_yaml, JobDefinition, TaskEntry};
use indexmap::IndexMap;
use inject::{VarInjection, TEMPLATE_VERSION_VAR};
use prov_core::{GatewayError, GatewayPorts, VmId};
use prov_recipes::{naming, RecipeRegistry};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PRIVATE_KEY_FILE: &str = "private_key";
pub const INVENTORY_FILE: &str = "inventory.yml";
pub const DEFINITION_FILE: &str = "playbook.yml";
pub const STDOUT_LOG: &str = "stdout.log";
pub const STDERR_LOG: &str = "stderr.log";

const CHANGE_KEY_TASKS: &str = include_str!("../../resources/change_key.yml");
const CHANGE_KEY_FILE: &str = "change_key.yml";
const CHANGE_KEY_VARS_FILE: &str = "change_key_vars_file.yml";

/// Free-form variables a caller supplies for one recipe.
pub type RecipeVars = IndexMap<String, Value>;

/// What to provision and where. Recipe order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub vm_id: VmId,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub recipes: IndexMap<String, RecipeVars>,
    pub public_key: String,
    #[serde(default)]
    pub site: Option<String>,
}

impl JobRequest {
    /// Address the VM through the gateway: the host is the gateway and the
    /// port is the SSH port mapped from the VM's private address.
    pub fn through_gateway(
        vm_id: VmId,
        gateway_host: &str,
        private_address: &str,
        ports: &GatewayPorts,
        public_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let mapping = ports.map_address(private_address)?;
        Ok(Self {
            vm_id,
            host: gateway_host.to_string(),
            port: mapping.ssh_port,
            recipes: IndexMap::new(),
            public_key: public_key.into(),
            site: None,
        })
    }

    pub fn with_recipe(mut self, name: impl Into<String>, vars: RecipeVars) -> Self {
        self.recipes.insert(name.into(), vars);
        self
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Tasks run without the recipe's variables file.
    TaskOnly,
    /// The recipe was left out of the job.
    Skipped,
}

prov_core::simple_display! {
    Degradation {
        TaskOnly => "task-only",
        Skipped => "skipped",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedFragment {
    pub recipe: String,
    pub degradation: Degradation,
    pub reason: String,
}

/// A composed job directory.
#[derive(Debug, Clone)]
pub struct Job {
    pub vm_id: VmId,
    pub dir: PathBuf,
    pub definition: JobDefinition,
    pub degraded: Vec<DegradedFragment>,
}

impl Job {
    pub fn inventory_path(&self) -> PathBuf {
        self.dir.join(INVENTORY_FILE)
    }

    pub fn definition_path(&self) -> PathBuf {
        self.dir.join(DEFINITION_FILE)
    }

    pub fn private_key_path(&self) -> PathBuf {
        self.dir.join(PRIVATE_KEY_FILE)
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.dir.join(STDOUT_LOG)
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.dir.join(STDERR_LOG)
    }

    /// Remove the job directory. Best-effort.
    pub fn remove_dir(&self) {
        remove_dir_logged(&self.dir);
    }
}

pub(crate) fn remove_dir_logged(dir: &Path) {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => tracing::debug!(dir = %dir.display(), "removed job directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to remove job directory"),
    }
}

#[derive(Debug, Clone)]
pub struct ComposerSettings {
    /// Parent of every job directory.
    pub jobs_dir: PathBuf,
    pub remote_user: String,
    pub interpreter: String,
}

impl ComposerSettings {
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            remote_user: "ubuntu".to_string(),
            interpreter: "/usr/bin/python3".to_string(),
        }
    }
}

enum Fragment {
    Full { task: TaskEntry, vars_file: String },
    TaskOnly { task: TaskEntry, reason: String },
    Skipped { reason: String },
}

pub struct Composer {
    registry: Arc<RecipeRegistry>,
    settings: ComposerSettings,
}

impl Composer {
    pub fn new(registry: Arc<RecipeRegistry>, settings: ComposerSettings) -> Self {
        Self { registry, settings }
    }

    pub fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    /// Build a fresh job directory for `request`.
    ///
    /// Recipe-level problems degrade the job; any other failure removes
    /// the partially written directory and returns an error.
    pub fn compose(&self, request: &JobRequest, private_key: &str) -> Result<Job, ComposeError> {
        let dir = self.create_work_dir(&request.vm_id)?;
        match self.populate(&dir, request, private_key) {
            Ok((definition, degraded)) => {
                tracing::info!(
                    vm_id = %request.vm_id,
                    dir = %dir.display(),
                    tasks = definition.task_files().len(),
                    degraded = degraded.len(),
                    "composed job"
                );
                Ok(Job { vm_id: request.vm_id.clone(), dir, definition, degraded })
            }
            Err(e) => {
                remove_dir_logged(&dir);
                Err(e)
            }
        }
    }

    fn create_work_dir(&self, vm_id: &VmId) -> Result<PathBuf, ComposeError> {
        let jobs_dir = &self.settings.jobs_dir;
        std::fs::create_dir_all(jobs_dir)
            .map_err(|source| ComposeError::WorkDir { path: jobs_dir.clone(), source })?;
        let dir = jobs_dir.join(format!("{}-{}", vm_id, uuid::Uuid::new_v4().simple()));
        DirBuilder::new()
            .mode(0o700)
            .create(&dir)
            .map_err(|source| ComposeError::WorkDir { path: dir.clone(), source })?;
        Ok(dir)
    }

    fn populate(
        &self,
        dir: &Path,
        request: &JobRequest,
        private_key: &str,
    ) -> Result<(JobDefinition, Vec<DegradedFragment>), ComposeError> {
        let key_path = dir.join(PRIVATE_KEY_FILE);
        write_private_key(&key_path, private_key).map_err(ComposeError::PrivateKey)?;

        let mut vars_files = Vec::new();
        let mut block = Vec::new();
        let mut degraded = Vec::new();
        for (recipe, caller) in &request.recipes {
            match self.add_recipe(dir, recipe, caller, request.site.as_deref()) {
                Fragment::Full { task, vars_file } => {
                    vars_files.push(vars_file);
                    block.push(task);
                }
                Fragment::TaskOnly { task, reason } => {
                    tracing::warn!(vm_id = %request.vm_id, recipe = %recipe, %reason, "recipe runs without variables");
                    degraded.push(DegradedFragment {
                        recipe: recipe.clone(),
                        degradation: Degradation::TaskOnly,
                        reason,
                    });
                    block.push(task);
                }
                Fragment::Skipped { reason } => {
                    tracing::warn!(vm_id = %request.vm_id, recipe = %recipe, %reason, "skipping recipe");
                    degraded.push(DegradedFragment {
                        recipe: recipe.clone(),
                        degradation: Degradation::Skipped,
                        reason,
                    });
                }
            }
        }

        write_file(dir, CHANGE_KEY_FILE, CHANGE_KEY_TASKS)?;
        let change_key_vars = Mapping::from_iter([(
            Value::from("change_key_vars"),
            Value::Mapping(Mapping::from_iter([(
                Value::from("key"),
                Value::from(request.public_key.as_str()),
            )])),
        )]);
        write_yaml(dir, CHANGE_KEY_VARS_FILE, &change_key_vars)?;
        vars_files.push(CHANGE_KEY_VARS_FILE.to_string());
        let always = vec![TaskEntry { name: "Change public key".to_string(), include_tasks: CHANGE_KEY_FILE.to_string() }];

        let inventory = inventory_yaml(
            &request.host,
            request.port,
            &self.settings.remote_user,
            &key_path.to_string_lossy(),
            &self.settings.interpreter,
        )
        .map_err(|source| ComposeError::Serialize { file: INVENTORY_FILE.to_string(), source })?;
        write_file(dir, INVENTORY_FILE, &inventory)?;

        let mut definition = self.load_template()?;
        definition.splice(vars_files, block, always);
        let yaml = definition
            .to_yaml()
            .map_err(|source| ComposeError::Serialize { file: DEFINITION_FILE.to_string(), source })?;
        write_file(dir, DEFINITION_FILE, &yaml)?;

        Ok((definition, degraded))
    }

    fn add_recipe(&self, dir: &Path, recipe: &str, caller: &RecipeVars, site: Option<&str>) -> Fragment {
        let Some(metadata) = self.registry.get(recipe) else {
            return Fragment::Skipped { reason: "unknown recipe".to_string() };
        };
        let version = if metadata.needs_approval {
            let requested = caller.get(TEMPLATE_VERSION_VAR).and_then(Value::as_str);
            match self.registry.negotiate_version(recipe, requested) {
                Some(v) => Some(v),
                None => return Fragment::Skipped { reason: "no approved version".to_string() },
            }
        } else {
            None
        };

        let store = self.registry.store();
        let Some(source) = store.task_file(recipe, site) else {
            return Fragment::Skipped { reason: "task file not found".to_string() };
        };
        let task_file = naming::task_file(recipe);
        if let Err(e) = std::fs::copy(&source, dir.join(&task_file)) {
            return Fragment::Skipped { reason: format!("failed to copy task file: {}", e) };
        }
        let task = TaskEntry::for_recipe(recipe, task_file);

        let mut doc = match load_vars(&store.vars_file(recipe)) {
            Ok(doc) => doc,
            Err(reason) => return Fragment::TaskOnly { task, reason },
        };
        let injection = VarInjection::for_recipe(recipe, Some(&metadata));
        injection.apply(recipe, &mut doc, caller, version.as_deref());
        let vars_file = naming::vars_file(recipe);
        match write_yaml(dir, &vars_file, &doc) {
            Ok(()) => Fragment::Full { task, vars_file },
            Err(e) => Fragment::TaskOnly { task, reason: e.to_string() },
        }
    }

    fn load_template(&self) -> Result<JobDefinition, ComposeError> {
        let path = self.registry.store().file(naming::JOB_TEMPLATE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => JobDefinition::parse_template(&content)
                .map_err(|source| ComposeError::Template { path, source }),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable job template, using default");
                }
                JobDefinition::default_template()
                    .map_err(|source| ComposeError::Template { path, source })
            }
        }
    }
}

/// Load a recipe variables file. Errors carry the degradation reason.
fn load_vars(path: &Path) -> Result<Mapping, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err("no variables file".to_string());
        }
        Err(e) => return Err(format!("unreadable variables file: {}", e)),
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(Value::Mapping(doc)) => Ok(doc),
        Ok(_) => Err("variables file is not a mapping".to_string()),
        Err(e) => Err(format!("malformed variables file: {}", e)),
    }
}

fn write_private_key(path: &Path, key: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).mode(0o600).open(path)?;
    file.write_all(key.as_bytes())?;
    // ssh rejects keys without a trailing newline
    if !key.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    file.sync_all()
}

fn write_file(dir: &Path, file: &str, content: &str) -> Result<(), ComposeError> {
    std::fs::write(dir.join(file), content)
        .map_err(|source| ComposeError::Write { file: file.to_string(), source })
}

fn write_yaml(dir: &Path, file: &str, doc: &Mapping) -> Result<(), ComposeError> {
    let yaml = serde_yaml::to_string(doc)
        .map_err(|source| ComposeError::Serialize { file: file.to_string(), source })?;
    write_file(dir, file, &yaml)
}

#[cfg(test)]
#[path = "compose_tests.rs"]
mod tests;
