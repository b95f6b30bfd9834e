// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! VM identity.

crate::define_id! {
    /// Identity of a virtual machine as assigned by the cloud backend.
    ///
    /// Keys the durable provisioning record and the active job registry.
    pub struct VmId;
}

impl VmId {
    /// Whether the id can be used as a durable store key and a directory
    /// name component: non-empty ASCII alphanumerics plus `-`, `_` and `.`,
    /// not starting with a dot.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && !self.0.starts_with('.')
            && self.0.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
