// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broken recipe fragments degrade the job instead of failing it.

use crate::prelude::*;

#[tokio::test]
async fn deleted_vars_file_keeps_task_in_order() {
    let harness = Harness::new().await;
    std::fs::remove_file(harness.recipes_dir().join("bioconda_vars_file.yml")).unwrap();
    let req = request("vm-1", &[("bioconda", RecipeVars::new()), ("guacamole", RecipeVars::new())]);

    let job = harness.composer().compose(&req, PRIVATE_KEY).unwrap();

    assert_eq!(job.definition.task_files(), vec!["bioconda.yml", "guacamole.yml"]);
    assert!(!job.definition.vars_files().iter().any(|f| f == "bioconda_vars_file.yml"));
    assert_eq!(job.degraded.len(), 1);
    assert_eq!(job.degraded[0].recipe, "bioconda");
    assert_eq!(job.degraded[0].degradation, Degradation::TaskOnly);
}

#[tokio::test]
async fn unknown_and_unapproved_recipes_are_skipped() {
    let harness = Harness::new().await;
    let req = request(
        "vm-1",
        &[
            ("jupyter", RecipeVars::new()),
            ("theia", vars(&[("template_version", "9.9.9")])),
            ("guacamole", RecipeVars::new()),
        ],
    );

    let job = harness.composer().compose(&req, PRIVATE_KEY).unwrap();

    // An unapproved requested version falls back to the newest approved one
    assert_eq!(job.definition.task_files(), vec!["theia.yml", "guacamole.yml"]);
    assert_eq!(job.degraded.len(), 1);
    assert_eq!(job.degraded[0].recipe, "jupyter");
    assert_eq!(job.degraded[0].degradation, Degradation::Skipped);
}
