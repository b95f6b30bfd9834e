// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning daemon library
//!
//! Configuration, logging, lifecycle and the background loops behind the
//! `provd` binary.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod tasks;

pub use config::Config;
pub use lifecycle::{startup, wait_for_signal, Daemon, LifecycleError};
pub use tasks::Tasks;
