// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Approved versions as seen by the composer.

use crate::prelude::*;

#[tokio::test]
async fn approved_versions_are_strictly_descending() {
    let harness = Harness::new().await;

    let versions = harness.registry.get_approved_versions("theia");

    assert_eq!(versions, vec!["1.10.0", "1.9.0", "1.0.0"]);
}

#[tokio::test]
async fn recipes_without_approval_have_no_version_list() {
    let harness = Harness::new().await;

    assert!(harness.registry.get_approved_versions("bioconda").is_empty());
    assert!(harness.registry.is_image_allowed(&["bioconda"]));
    assert!(harness.registry.is_image_allowed(&["theia", "1.9.0"]));
    assert!(!harness.registry.is_image_allowed(&["theia", "2.0.0"]));
}
