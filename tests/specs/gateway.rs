// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway port mapping from a VM's private address.

use crate::prelude::*;

#[test]
fn private_address_maps_to_ssh_port_and_udp_block() {
    let ports = GatewayPorts::new(30000, 1, 10).unwrap();

    let mapping = ports.map_address("10.0.5.37").unwrap();

    assert_eq!(mapping.ssh_port, 30037);
    assert_eq!(mapping.udp_range(), 30370..=30379);
    assert_eq!(ports.map_address("10.0.5.37").unwrap(), mapping);
}

#[test]
fn every_octet_follows_the_formula() {
    let ports = GatewayPorts::new(30000, 3, 10).unwrap();
    for octet in 0..=u8::MAX {
        let mapping = ports.map_address(&format!("172.16.0.{}", octet)).unwrap();
        assert_eq!(u32::from(mapping.ssh_port), 30000 + u32::from(octet) * 3);
        assert_eq!(u32::from(mapping.udp_start), 30000 + u32::from(octet) * 10);
    }
}

#[tokio::test]
async fn composed_inventory_addresses_the_gateway() {
    let harness = Harness::new().await;
    let ports = GatewayPorts::new(30000, 1, 10).unwrap();
    let req = JobRequest::through_gateway(VmId::new("vm-gw"), "gateway.example.org", "10.0.5.37", &ports, PUBLIC_KEY)
        .unwrap();

    let job = harness.composer().compose(&req, PRIVATE_KEY).unwrap();

    let inventory = read_yaml(&job.inventory_path());
    let host = &inventory["vm"]["hosts"]["gateway.example.org:30037"];
    assert_eq!(host["ansible_user"], Value::from("ubuntu"));
    assert_eq!(
        host["ansible_ssh_private_key_file"],
        Value::from(job.private_key_path().to_string_lossy().as_ref())
    );
}
