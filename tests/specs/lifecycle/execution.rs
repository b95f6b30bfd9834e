// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs run to completion and their outcome reaches the durable record.

use crate::prelude::*;

#[tokio::test]
async fn failing_job_is_recorded_failed_with_captured_stderr() {
    let harness = Harness::new().await;
    let provisioner = harness.provisioner("echo 'TASK [bioconda] failed' >&2; exit 1");
    let vm_id = VmId::new("vm-fail");
    provisioner.prepare(&vm_id, PRIVATE_KEY, "workstation").unwrap();
    provisioner.start_provisioning(&request("vm-fail", &[("bioconda", RecipeVars::new())])).unwrap();

    assert_eq!(wait_for_exit(&provisioner, &vm_id), JobStatus::Failed);
    assert_eq!(provisioner.status(&vm_id).unwrap(), Some(ProvisioningState::BuildFailed));

    let logs = provisioner.logs(&vm_id).unwrap();
    assert_eq!(logs.exit_code, ExitCode::Code(1));
    assert_eq!(logs.stderr, "TASK [bioconda] failed\n");

    provisioner.cleanup(&vm_id).unwrap();
    assert!(ProvisioningRecord::load(provisioner.store(), &vm_id).unwrap().is_none());
    assert_eq!(harness.job_dirs(), 0);
}

#[tokio::test]
async fn succeeding_job_becomes_active() {
    let harness = Harness::new().await;
    let provisioner = harness.provisioner("echo provisioned; exit 0");
    let vm_id = VmId::new("vm-ok");
    provisioner.prepare(&vm_id, PRIVATE_KEY, "workstation").unwrap();
    provisioner.start_provisioning(&request("vm-ok", &[("guacamole", RecipeVars::new())])).unwrap();

    assert_eq!(wait_for_exit(&provisioner, &vm_id), JobStatus::Succeeded);
    assert_eq!(provisioner.status(&vm_id).unwrap(), Some(ProvisioningState::Active));

    let logs = provisioner.logs(&vm_id).unwrap();
    assert_eq!(logs.exit_code, ExitCode::Code(0));
    assert_eq!(logs.stdout, "provisioned\n");
    assert!(!provisioner.active().contains(&vm_id));
    assert_eq!(harness.job_dirs(), 0);
}

#[tokio::test]
async fn terminal_state_is_never_overwritten_by_later_polls() {
    let harness = Harness::new().await;
    let provisioner = harness.provisioner("exit 0");
    let vm_id = VmId::new("vm-fwd");
    provisioner.prepare(&vm_id, PRIVATE_KEY, "workstation").unwrap();
    provisioner.start_provisioning(&request("vm-fwd", &[])).unwrap();
    wait_for_exit(&provisioner, &vm_id);

    for _ in 0..3 {
        assert_eq!(provisioner.poll_status(&vm_id).unwrap(), Some(JobStatus::Succeeded));
    }
    let advanced =
        ProvisioningRecord::advance(provisioner.store(), &vm_id, ProvisioningState::BuildRunning).unwrap();

    assert!(!advanced);
    assert_eq!(provisioner.status(&vm_id).unwrap(), Some(ProvisioningState::Active));
    provisioner.cleanup(&vm_id).unwrap();
}

#[tokio::test]
async fn second_start_for_same_vm_is_rejected() {
    let harness = Harness::new().await;
    let provisioner = harness.provisioner("sleep 30");
    let vm_id = VmId::new("vm-dup");
    provisioner.prepare(&vm_id, PRIVATE_KEY, "workstation").unwrap();
    provisioner.start_provisioning(&request("vm-dup", &[])).unwrap();

    let err = provisioner.start_provisioning(&request("vm-dup", &[])).unwrap_err();

    assert!(matches!(err, prov_engine::ProvisionError::AlreadyActive(_)), "{:?}", err);
    assert_eq!(harness.job_dirs(), 1);
    provisioner.stop(&vm_id).unwrap();
}

#[tokio::test]
async fn launch_failure_leaves_no_partial_state() {
    let harness = Harness::new().await;
    let runner = RunnerConfig { program: "/nonexistent/ansible-playbook".to_string(), ..shell_runner("") };
    let provisioner = Provisioner::new(
        std::sync::Arc::new(prov_storage::MemoryStore::new()),
        harness.composer(),
        runner,
    );
    let vm_id = VmId::new("vm-launch");
    provisioner.prepare(&vm_id, PRIVATE_KEY, "workstation").unwrap();

    let err = provisioner.start_provisioning(&request("vm-launch", &[])).unwrap_err();

    assert!(matches!(err, prov_engine::ProvisionError::Launch(_)), "{:?}", err);
    assert!(provisioner.active().is_empty());
    assert_eq!(harness.job_dirs(), 0);
    assert_eq!(provisioner.status(&vm_id).unwrap(), Some(ProvisioningState::PrepareBuild));
}
