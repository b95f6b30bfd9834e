// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed job-definition (playbook) and inventory documents.
//!
//! Both are assembled in memory and serialized exactly once.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Host group shared by the inventory and the job definition.
pub const HOST_GROUP: &str = "vm";

const DEFAULT_TEMPLATE: &str = r#"
- name: Provision research environments
  hosts: vm
  become: true
  gather_facts: true
  vars_files: []
  tasks:
    - name: Apply research environment recipes
      block: []
      always: []
"#;

/// One `include_tasks` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub name: String,
    pub include_tasks: String,
}

impl TaskEntry {
    pub fn for_recipe(recipe: &str, file: impl Into<String>) -> Self {
        Self { name: format!("Running {} tasks", recipe), include_tasks: file.into() }
    }
}

/// The block/always pair every job definition carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBlock {
    #[serde(flatten)]
    pub settings: IndexMap<String, Value>,
    #[serde(default)]
    pub block: Vec<TaskEntry>,
    #[serde(default)]
    pub always: Vec<TaskEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    #[serde(flatten)]
    pub settings: IndexMap<String, Value>,
    #[serde(default)]
    pub vars_files: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskBlock>,
}

/// A job definition: the template's first play with our lists spliced in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobDefinition {
    pub plays: Vec<Play>,
}

impl JobDefinition {
    pub fn parse_template(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn default_template() -> Result<Self, serde_yaml::Error> {
        Self::parse_template(DEFAULT_TEMPLATE)
    }

    /// Replace the vars-file list, task block and always block of the
    /// first play. A template without plays or task blocks gets them.
    pub fn splice(&mut self, vars_files: Vec<String>, block: Vec<TaskEntry>, always: Vec<TaskEntry>) {
        if self.plays.is_empty() {
            self.plays.push(Play {
                settings: IndexMap::from([("hosts".to_string(), Value::from(HOST_GROUP))]),
                vars_files: Vec::new(),
                tasks: Vec::new(),
            });
        }
        let play = &mut self.plays[0];
        play.vars_files = vars_files;
        let settings = play.tasks.first().map(|t| t.settings.clone()).unwrap_or_default();
        play.tasks = vec![TaskBlock { settings, block, always }];
    }

    fn first_block(&self) -> Option<&TaskBlock> {
        self.plays.first().and_then(|p| p.tasks.first())
    }

    /// Ordered task files of the main block.
    pub fn task_files(&self) -> Vec<&str> {
        self.first_block()
            .map(|b| b.block.iter().map(|t| t.include_tasks.as_str()).collect())
            .unwrap_or_default()
    }

    /// Task files run regardless of earlier failures.
    pub fn always_files(&self) -> Vec<&str> {
        self.first_block()
            .map(|b| b.always.iter().map(|t| t.include_tasks.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn vars_files(&self) -> &[String] {
        self.plays.first().map(|p| p.vars_files.as_slice()).unwrap_or_default()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[derive(Debug, Serialize)]
struct InventoryHost {
    ansible_user: String,
    ansible_ssh_private_key_file: String,
    ansible_python_interpreter: String,
}

#[derive(Debug, Serialize)]
struct InventoryGroup {
    hosts: IndexMap<String, InventoryHost>,
}

/// Single-group inventory addressing the VM at `host:port`.
pub fn inventory_yaml(
    host: &str,
    port: u16,
    remote_user: &str,
    private_key_file: &str,
    interpreter: &str,
) -> Result<String, serde_yaml::Error> {
    let host_entry = InventoryHost {
        ansible_user: remote_user.to_string(),
        ansible_ssh_private_key_file: private_key_file.to_string(),
        ansible_python_interpreter: interpreter.to_string(),
    };
    let group = InventoryGroup { hosts: IndexMap::from([(format!("{}:{}", host, port), host_entry)]) };
    serde_yaml::to_string(&IndexMap::from([(HOST_GROUP.to_string(), group)]))
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
