// Fixed-capacity process table
use core::ops::{Index, IndexMut};

use crate::config::MAX_PROC;
use crate::error::KernelError;
use crate::hal::Hal;
use crate::process::pcb::{Pcb, Pid, ProcessState};

/// Process table: the sole owner of every PCB
pub struct ProcessTable<H: Hal> {
    slots: [Pcb<H>; MAX_PROC],
}

impl<H: Hal> ProcessTable<H> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(Pcb::<H>::unused),
        }
    }

    /// First free slot, by linear scan
    pub fn allocate_slot(&self) -> Result<Pid, KernelError> {
        self.slots
            .iter()
            .position(|pcb| pcb.state == ProcessState::Unused)
            .ok_or(KernelError::ResourceExhausted)
    }

    pub fn get(&self, pid: Pid) -> Option<&Pcb<H>> {
        self.slots.get(pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Pcb<H>> {
        self.slots.get_mut(pid)
    }

    /// Mutable access to one PCB alongside shared access to another
    pub fn pair_mut(&mut self, a: Pid, b: Pid) -> Option<(&mut Pcb<H>, &Pcb<H>)> {
        if a == b || a >= MAX_PROC || b >= MAX_PROC {
            return None;
        }
        if a < b {
            let (low, high) = self.slots.split_at_mut(b);
            Some((&mut low[a], &high[0]))
        } else {
            let (low, high) = self.slots.split_at_mut(a);
            Some((&mut high[0], &low[b]))
        }
    }

    /// Return a torn-down slot to the free pool
    pub fn reap(&mut self, pid: Pid) {
        if let Some(pcb) = self.slots.get_mut(pid) {
            debug_assert!(pcb.image.is_none() && pcb.stack.is_none());
            *pcb = Pcb::unused(pid);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pcb<H>> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pcb<H>> {
        self.slots.iter_mut()
    }

    pub fn iter_live(&self) -> impl Iterator<Item = &Pcb<H>> {
        self.slots.iter().filter(|pcb| pcb.is_live())
    }

    /// Live processes whose parent is `pid`
    pub fn count_children(&self, pid: Pid) -> usize {
        self.iter_live().filter(|pcb| pcb.parent == Some(pid)).count()
    }
}

impl<H: Hal> Default for ProcessTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Hal> Index<Pid> for ProcessTable<H> {
    type Output = Pcb<H>;

    fn index(&self, pid: Pid) -> &Pcb<H> {
        &self.slots[pid]
    }
}

impl<H: Hal> IndexMut<Pid> for ProcessTable<H> {
    fn index_mut(&mut self, pid: Pid) -> &mut Pcb<H> {
        &mut self.slots[pid]
    }
}
