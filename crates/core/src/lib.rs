// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prov-core: Core types for the research-environment provisioning daemon

pub mod macros;

pub mod gateway;
pub mod id;
pub mod state;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use gateway::{GatewayError, GatewayPorts, PortMapping, UDP_BLOCK_SIZE};
pub use id::VmId;
pub use state::{ProvisioningState, UnknownState};
pub use status::{ExitCode, JobLogs, JobStatus};
