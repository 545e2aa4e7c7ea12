// Scheduler statistics and queue dumps
use crate::hal::Hal;
use crate::kernel::Kernel;
use crate::process::pcb::QueueId;

/// Snapshot of scheduler activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemStats {
    pub live: usize,
    pub ready: usize,
    pub sleeping: usize,
    pub waiting: usize,
    pub context_switches: u64,
    pub ticks: u64,
    pub renormalizations: u64,
}

impl<H: Hal> Kernel<H> {
    pub fn stats(&self) -> SystemStats {
        SystemStats {
            live: self.table.iter_live().count(),
            ready: self.ready.len(),
            sleeping: self.sleeping.len(),
            waiting: self.waiting.len(),
            context_switches: self.context_switches,
            ticks: self.ticks,
            renormalizations: self.renormalizations,
        }
    }

    /// Log a queue's members with their effective priorities
    pub fn dump_queue(&self, queue: QueueId) {
        crate::serial_print!("[SCHED] {:?}:", queue);
        for pid in self.queue_order(queue) {
            crate::serial_print!(" {}({})", pid, self.table[pid].effective_priority);
        }
        crate::serial_println!();
    }
}
