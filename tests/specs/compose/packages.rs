// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conda package lists become structured maps in the job's variables.

use crate::prelude::*;

#[tokio::test]
async fn bioconda_packages_are_structured_by_name() {
    let harness = Harness::new().await;
    let req = request("vm-pkg", &[("bioconda", vars(&[("packages", "numpy=1.2=0 scipy=1.3=1")]))]);

    let job = harness.composer().compose(&req, PRIVATE_KEY).unwrap();

    let doc = read_yaml(&job.dir.join("bioconda_vars_file.yml"));
    let expected: Value = serde_yaml::from_str(
        "bioconda_tools:\n  \
           channels: [conda-forge, bioconda]\n  \
           packages:\n    \
             numpy: {version: '1.2', build: '0'}\n    \
             scipy: {version: '1.3', build: '1'}\n",
    )
    .unwrap();
    similar_asserts::assert_eq!(doc, expected);
    assert!(job.degraded.is_empty());
}

#[tokio::test]
async fn bare_package_names_carry_no_version() {
    let harness = Harness::new().await;
    let req = request("vm-pkg", &[("bioconda", vars(&[("packages", "samtools bwa=0.7.17")]))]);

    let job = harness.composer().compose(&req, PRIVATE_KEY).unwrap();

    let doc = read_yaml(&job.dir.join("bioconda_vars_file.yml"));
    let packages = &doc["bioconda_tools"]["packages"];
    assert_eq!(packages["samtools"], serde_yaml::from_str::<Value>("{}").unwrap());
    assert_eq!(packages["bwa"]["version"], Value::from("0.7.17"));
    assert!(packages["bwa"].get("build").is_none());
}
