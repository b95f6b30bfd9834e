// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe-specific rewrites of a variables document before it is written
//! into the job directory.

use super::RecipeVars;
use indexmap::IndexMap;
use prov_recipes::RecipeMetadata;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Caller variable holding the space-separated package list.
pub const PACKAGES_VAR: &str = "packages";
/// Caller variable naming a preferred template version.
pub const TEMPLATE_VERSION_VAR: &str = "template_version";

/// The closed set of injections a recipe can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarInjection {
    /// `packages` becomes `<name>_tools.packages`.
    CondaPackages,
    /// Negotiated version and boolean flags go into `<name>_vars`.
    TemplateVersion,
    None,
}

/// Recipes with a fixed injection, independent of metadata.
const BY_NAME: &[(&str, VarInjection)] =
    &[("bioconda", VarInjection::CondaPackages), ("conda", VarInjection::CondaPackages)];

prov_core::simple_display! {
    VarInjection {
        CondaPackages => "conda-packages",
        TemplateVersion => "template-version",
        None => "none",
    }
}

impl VarInjection {
    pub fn for_recipe(name: &str, metadata: Option<&RecipeMetadata>) -> Self {
        if let Some((_, injection)) = BY_NAME.iter().find(|(n, _)| *n == name) {
            return *injection;
        }
        match metadata {
            Some(m) if m.needs_approval => VarInjection::TemplateVersion,
            _ => VarInjection::None,
        }
    }

    /// Rewrite `doc` in place. `version` is the negotiated template
    /// version for approval-gated recipes.
    pub fn apply(&self, recipe: &str, doc: &mut Mapping, caller: &RecipeVars, version: Option<&str>) {
        match self {
            VarInjection::CondaPackages => {
                let Some(raw) = caller.get(PACKAGES_VAR).and_then(Value::as_str) else {
                    return;
                };
                let packages = match serde_yaml::to_value(parse_packages(recipe, raw)) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(recipe, error = %e, "failed to encode package list");
                        return;
                    }
                };
                with_section(doc, &format!("{}_tools", recipe), |tools| {
                    tools.insert(Value::from(PACKAGES_VAR), packages);
                });
            }
            VarInjection::TemplateVersion => {
                with_section(doc, &format!("{}_vars", recipe), |vars| {
                    if let Some(version) = version {
                        vars.insert(Value::from(TEMPLATE_VERSION_VAR), Value::from(version));
                    }
                    for (key, value) in caller {
                        if let Some(flag) = as_flag(value) {
                            vars.insert(Value::from(key.as_str()), Value::Bool(flag));
                        }
                    }
                });
            }
            VarInjection::None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
}

/// Parse `name=version=build` tokens. Version and build are optional;
/// tokens without a name or with extra segments are dropped.
pub fn parse_packages(recipe: &str, raw: &str) -> IndexMap<String, PackageSpec> {
    let mut packages = IndexMap::new();
    for token in raw.split_whitespace() {
        let token = token.trim_matches(|c| c == '"' || c == '\'');
        let parts: Vec<&str> = token.split('=').collect();
        if parts.len() > 3 || parts[0].is_empty() {
            tracing::warn!(recipe, token, "ignoring malformed package token");
            continue;
        }
        let part = |i: usize| parts.get(i).filter(|s| !s.is_empty()).map(|s| s.to_string());
        packages.insert(parts[0].to_string(), PackageSpec { version: part(1), build: part(2) });
    }
    packages
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Run `f` on the nested mapping under `key`, replacing a non-mapping
/// value. Existing keys keep their position.
fn with_section(doc: &mut Mapping, key: &str, f: impl FnOnce(&mut Mapping)) {
    let key = Value::from(key);
    if !doc.get(&key).is_some_and(Value::is_mapping) {
        doc.insert(key.clone(), Value::Mapping(Mapping::new()));
    }
    if let Some(Value::Mapping(section)) = doc.get_mut(&key) {
        f(section);
    }
}

#[cfg(test)]
#[path = "inject_tests.rs"]
mod tests;
