// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of jobs currently owned by this process, keyed by VM id.

use crate::runner::JobRunner;
use parking_lot::Mutex;
use prov_core::VmId;
use std::collections::HashMap;

enum Slot {
    /// Reserved by a start in progress.
    Starting,
    Running(Box<JobRunner>),
}

#[derive(Default)]
pub struct ActiveJobs {
    slots: Mutex<HashMap<VmId, Slot>>,
}

impl ActiveJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `vm_id`. Returns `None` if it is already taken.
    ///
    /// The slot is released when the reservation drops without a commit.
    pub fn reserve(&self, vm_id: &VmId) -> Option<Reservation<'_>> {
        let mut slots = self.slots.lock();
        if slots.contains_key(vm_id) {
            return None;
        }
        slots.insert(vm_id.clone(), Slot::Starting);
        Some(Reservation { jobs: self, vm_id: vm_id.clone(), committed: false })
    }

    /// Run `f` against the runner for `vm_id` while holding the lock.
    ///
    /// `f` must not block; it is meant for `try_wait`-style probes.
    pub fn with_runner<R>(&self, vm_id: &VmId, f: impl FnOnce(&mut JobRunner) -> R) -> Option<R> {
        let mut slots = self.slots.lock();
        match slots.get_mut(vm_id) {
            Some(Slot::Running(runner)) => Some(f(runner)),
            _ => None,
        }
    }

    /// Remove and return the runner. A slot still starting stays put.
    pub fn take(&self, vm_id: &VmId) -> Option<JobRunner> {
        let mut slots = self.slots.lock();
        if !matches!(slots.get(vm_id), Some(Slot::Running(_))) {
            return None;
        }
        match slots.remove(vm_id) {
            Some(Slot::Running(runner)) => Some(*runner),
            _ => None,
        }
    }

    pub fn contains(&self, vm_id: &VmId) -> bool {
        self.slots.lock().contains_key(vm_id)
    }

    /// Ids with a running (not merely reserved) job, sorted.
    pub fn running_ids(&self) -> Vec<VmId> {
        let slots = self.slots.lock();
        let mut ids: Vec<VmId> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Running(_)))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every runner, leaving reservations in place.
    pub fn drain(&self) -> Vec<JobRunner> {
        let mut slots = self.slots.lock();
        let running: Vec<VmId> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Running(_)))
            .map(|(id, _)| id.clone())
            .collect();
        running
            .into_iter()
            .filter_map(|id| match slots.remove(&id) {
                Some(Slot::Running(runner)) => Some(*runner),
                _ => None,
            })
            .collect()
    }
}

/// A claimed slot awaiting its runner.
pub struct Reservation<'a> {
    jobs: &'a ActiveJobs,
    vm_id: VmId,
    committed: bool,
}

impl Reservation<'_> {
    pub fn vm_id(&self) -> &VmId {
        &self.vm_id
    }

    pub fn commit(mut self, runner: JobRunner) {
        self.jobs.slots.lock().insert(self.vm_id.clone(), Slot::Running(Box::new(runner)));
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.jobs.slots.lock().remove(&self.vm_id);
        }
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
