// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recipe order follows the request; the key change always runs last.

use crate::prelude::*;

#[tokio::test]
async fn task_order_follows_request_and_key_change_runs_last() {
    let harness = Harness::new().await;
    let composer = harness.composer();
    let a = ("bioconda", RecipeVars::new());
    let b = ("guacamole", RecipeVars::new());

    let ab = composer.compose(&request("vm-ab", &[a.clone(), b.clone()]), PRIVATE_KEY).unwrap();
    let ba = composer.compose(&request("vm-ba", &[b, a]), PRIVATE_KEY).unwrap();

    assert_eq!(ab.definition.task_files(), vec!["bioconda.yml", "guacamole.yml"]);
    assert_eq!(ba.definition.task_files(), vec!["guacamole.yml", "bioconda.yml"]);
    for job in [&ab, &ba] {
        assert_eq!(job.definition.always_files(), vec!["change_key.yml"]);
        assert_eq!(job.definition.vars_files().last().map(String::as_str), Some("change_key_vars_file.yml"));
    }
}

#[tokio::test]
async fn written_playbook_matches_composed_definition() {
    let harness = Harness::new().await;
    let req = request("vm-1", &[("theia", vars(&[("template_version", "1.9.0")]))]);

    let job = harness.composer().compose(&req, PRIVATE_KEY).unwrap();

    let playbook = read_yaml(&job.definition_path());
    let play = &playbook[0];
    assert_eq!(play["hosts"], Value::from("vm"));
    let block = &play["tasks"][0];
    assert_eq!(block["block"][0]["include_tasks"], Value::from("theia.yml"));
    assert_eq!(block["always"][0]["include_tasks"], Value::from("change_key.yml"));

    let theia = read_yaml(&job.dir.join("theia_vars_file.yml"));
    assert_eq!(theia["theia_vars"]["template_version"], Value::from("1.9.0"));
    assert_eq!(theia["theia_vars"]["port"], Value::from(8080));

    let key_vars = read_yaml(&job.dir.join("change_key_vars_file.yml"));
    assert_eq!(key_vars["change_key_vars"]["key"], Value::from(PUBLIC_KEY));
}

#[tokio::test]
async fn unrequested_version_gets_newest_approved() {
    let harness = Harness::new().await;

    let job = harness.composer().compose(&request("vm-1", &[("theia", RecipeVars::new())]), PRIVATE_KEY).unwrap();

    let theia = read_yaml(&job.dir.join("theia_vars_file.yml"));
    assert_eq!(theia["theia_vars"]["template_version"], Value::from("1.10.0"));
}
