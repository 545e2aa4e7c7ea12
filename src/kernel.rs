// Kernel state shared by the scheduler, blocking engine and dispatch
use crate::config::{SchedConfig, INIT_PID};
use crate::error::KernelError;
use crate::hal::{Hal, InterruptLevel, ProgramRef};
use crate::process::pcb::{Pcb, Pid, QueueId};
use crate::process::queue::ProcQueue;
use crate::process::table::ProcessTable;
use crate::process::Transfer;

/// Single-CPU kernel: process table, queues and the current process
pub struct Kernel<H: Hal> {
    pub(crate) hal: H,
    pub(crate) table: ProcessTable<H>,
    pub(crate) ready: ProcQueue,
    pub(crate) sleeping: ProcQueue,
    pub(crate) waiting: ProcQueue,
    pub(crate) current: Option<Pid>,
    /// The booted init process is still alive in `INIT_PID`
    pub(crate) init_alive: bool,
    pub(crate) reschedule_pending: bool,
    pub(crate) config: SchedConfig,
    pub(crate) ticks: u64,
    pub(crate) context_switches: u64,
    pub(crate) renormalizations: u64,
}

impl<H: Hal> Kernel<H> {
    pub fn new(hal: H) -> Self {
        Self::with_config(hal, SchedConfig::default())
    }

    pub fn with_config(hal: H, config: SchedConfig) -> Self {
        Self {
            hal,
            table: ProcessTable::new(),
            ready: ProcQueue::new(QueueId::Ready),
            sleeping: ProcQueue::new(QueueId::Sleeping),
            waiting: ProcQueue::new(QueueId::Waiting),
            current: None,
            init_alive: false,
            reschedule_pending: false,
            config,
            ticks: 0,
            context_switches: 0,
            renormalizations: 0,
        }
    }

    /// Create the init process and hand the CPU to it.
    /// The switch is performed here; the returned transfer is informational.
    pub fn boot(&mut self, init: ProgramRef) -> Result<Transfer, KernelError> {
        crate::serial_println!("[BOOT] Starting minikernel");
        let pid = self.create(init)?;
        self.init_alive = pid == INIT_PID;
        crate::serial_println!("[BOOT] Init process created with PID {}", pid);

        let first = self.pick();
        let transfer = self.handoff(None, first);
        self.perform(transfer);
        Ok(transfer)
    }

    /// Run `f` with every interrupt source masked
    pub(crate) fn critical<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.hal.set_interrupt_level(InterruptLevel::All);
        let result = f(self);
        self.hal.set_interrupt_level(previous);
        result
    }

    /// Defer a reschedule to the next software interrupt
    pub(crate) fn request_reschedule(&mut self) {
        self.reschedule_pending = true;
        self.hal.raise_software_interrupt();
    }

    fn split(&mut self, queue: QueueId) -> (&mut ProcQueue, &mut ProcessTable<H>) {
        let list = match queue {
            QueueId::Ready => &mut self.ready,
            QueueId::Sleeping => &mut self.sleeping,
            QueueId::Waiting => &mut self.waiting,
        };
        (list, &mut self.table)
    }

    pub(crate) fn enqueue_ready(&mut self, pid: Pid) {
        self.critical(|k| {
            let (list, table) = k.split(QueueId::Ready);
            list.insert_ordered(table, pid);
        });
    }

    pub(crate) fn enqueue_back(&mut self, queue: QueueId, pid: Pid) {
        self.critical(|k| {
            let (list, table) = k.split(queue);
            list.push_back(table, pid);
        });
    }

    pub(crate) fn dequeue(&mut self, queue: QueueId, pid: Pid) -> bool {
        self.critical(|k| {
            let (list, table) = k.split(queue);
            list.remove(table, pid)
        })
    }

    /// Restore ready-queue order after `pid`'s effective priority changed
    pub(crate) fn reorder(&mut self, pid: Pid) {
        if self.table[pid].queue != Some(QueueId::Ready) {
            return;
        }
        self.critical(|k| {
            let (list, table) = k.split(QueueId::Ready);
            list.remove(table, pid);
            list.insert_ordered(table, pid);
        });
    }

    /// Set the effective priority, reordering only when it changed
    pub(crate) fn apply_effective_priority(&mut self, pid: Pid, priority: i32) {
        if self.table[pid].effective_priority == priority {
            return;
        }
        self.table[pid].effective_priority = priority;
        self.reorder(pid);
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn pcb(&self, pid: Pid) -> Option<&Pcb<H>> {
        self.table.get(pid)
    }

    pub fn table(&self) -> &ProcessTable<H> {
        &self.table
    }

    pub fn queue(&self, queue: QueueId) -> &ProcQueue {
        match queue {
            QueueId::Ready => &self.ready,
            QueueId::Sleeping => &self.sleeping,
            QueueId::Waiting => &self.waiting,
        }
    }

    /// Pids of a queue, front to back
    pub fn queue_order(&self, queue: QueueId) -> impl Iterator<Item = Pid> + '_ {
        self.queue(queue).iter(&self.table)
    }

    pub fn is_reschedule_pending(&self) -> bool {
        self.reschedule_pending
    }

    pub fn config(&self) -> &SchedConfig {
        &self.config
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }
}
