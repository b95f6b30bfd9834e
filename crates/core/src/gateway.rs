// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway port mapping.
//!
//! One gateway host forwards to many VMs. Each VM's externally reachable
//! ports are derived from the last octet `x` of its private IPv4 address:
//!
//! ```text
//! ssh       = base_port + x * ssh_multiplier
//! udp_start = base_port + x * udp_multiplier     (block of UDP_BLOCK_SIZE ports)
//! ```
//!
//! The constants are validated once in [`GatewayPorts::new`], after which
//! the mapping is total over all octets and performs no I/O.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Number of UDP ports reserved per VM (start port plus the next nine).
pub const UDP_BLOCK_SIZE: u16 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("gateway constants overflow the port range (base {base_port}, multiplier {multiplier})")]
    PortOverflow { base_port: u16, multiplier: u16 },
}

#[derive(Debug, Clone, Deserialize)]
struct RawGatewayPorts {
    base_port: u16,
    ssh_multiplier: u16,
    udp_multiplier: u16,
}

/// Deployment-wide gateway constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGatewayPorts")]
pub struct GatewayPorts {
    base_port: u16,
    ssh_multiplier: u16,
    udp_multiplier: u16,
}

impl TryFrom<RawGatewayPorts> for GatewayPorts {
    type Error = GatewayError;

    fn try_from(raw: RawGatewayPorts) -> Result<Self, Self::Error> {
        Self::new(raw.base_port, raw.ssh_multiplier, raw.udp_multiplier)
    }
}

/// Computed ports for one VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub ssh_port: u16,
    pub udp_start: u16,
    pub udp_end: u16,
}

impl PortMapping {
    pub fn udp_range(&self) -> RangeInclusive<u16> {
        self.udp_start..=self.udp_end
    }
}

impl GatewayPorts {
    pub fn new(
        base_port: u16,
        ssh_multiplier: u16,
        udp_multiplier: u16,
    ) -> Result<Self, GatewayError> {
        let max_octet = u32::from(u8::MAX);
        let fits = |multiplier: u16, extra: u16| {
            u32::from(base_port) + max_octet * u32::from(multiplier) + u32::from(extra)
                <= u32::from(u16::MAX)
        };
        if !fits(ssh_multiplier, 0) {
            return Err(GatewayError::PortOverflow { base_port, multiplier: ssh_multiplier });
        }
        if !fits(udp_multiplier, UDP_BLOCK_SIZE - 1) {
            return Err(GatewayError::PortOverflow { base_port, multiplier: udp_multiplier });
        }
        Ok(Self { base_port, ssh_multiplier, udp_multiplier })
    }

    pub fn base_port(&self) -> u16 {
        self.base_port
    }

    // Bounds were checked in new(), so u16 arithmetic cannot overflow here.
    pub fn ssh_port(&self, octet: u8) -> u16 {
        self.base_port + u16::from(octet) * self.ssh_multiplier
    }

    pub fn udp_start(&self, octet: u8) -> u16 {
        self.base_port + u16::from(octet) * self.udp_multiplier
    }

    pub fn map_octet(&self, octet: u8) -> PortMapping {
        let udp_start = self.udp_start(octet);
        PortMapping {
            ssh_port: self.ssh_port(octet),
            udp_start,
            udp_end: udp_start + (UDP_BLOCK_SIZE - 1),
        }
    }

    pub fn map_ip(&self, ip: Ipv4Addr) -> PortMapping {
        self.map_octet(ip.octets()[3])
    }

    /// Map a textual private address such as `"10.0.5.37"`.
    pub fn map_address(&self, address: &str) -> Result<PortMapping, GatewayError> {
        let ip: Ipv4Addr = address
            .trim()
            .parse()
            .map_err(|_| GatewayError::InvalidAddress(address.to_string()))?;
        Ok(self.map_ip(ip))
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
