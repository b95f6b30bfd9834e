// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stopping a job persists its logs and tears everything down.

use crate::prelude::*;

#[tokio::test]
async fn logs_after_stop_equal_persisted_record() {
    let harness = Harness::new().await;
    let provisioner = harness.provisioner("echo started; echo warming >&2; sleep 30");
    let vm_id = VmId::new("vm-stop");
    provisioner.prepare(&vm_id, PRIVATE_KEY, "workstation").unwrap();
    provisioner.start_provisioning(&request("vm-stop", &[("theia", RecipeVars::new())])).unwrap();
    let record = ProvisioningRecord::load(provisioner.store(), &vm_id).unwrap().unwrap();
    let job_dir = record.job_dir.unwrap();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(job_dir.join("stdout.log")).is_ok_and(|s| s.contains("started"))
    }));

    let stopped = provisioner.stop(&vm_id).unwrap();

    assert_eq!(stopped.exit_code, ExitCode::Code(143));
    assert_eq!(stopped.stdout, "started\n");
    let persisted = StoredLogs::load(provisioner.store(), &vm_id).unwrap().unwrap();
    assert_eq!(persisted, stopped);
    assert_eq!(provisioner.logs(&vm_id).unwrap(), stopped);

    assert!(!job_dir.exists());
    assert!(ProvisioningRecord::load(provisioner.store(), &vm_id).unwrap().is_none());
    assert!(!provisioner.active().contains(&vm_id));
}

#[tokio::test]
async fn unknown_vm_reports_unknown_logs() {
    let harness = Harness::new().await;
    let provisioner = harness.provisioner("exit 0");

    let logs = provisioner.logs(&VmId::new("vm-never")).unwrap();

    assert!(logs.is_unknown());
    assert_eq!(provisioner.stop(&VmId::new("vm-never")).unwrap(), JobLogs::unknown());
}
