// Blocking and waking: sleep and wait-for-children
use crate::error::KernelError;
use crate::hal::Hal;
use crate::kernel::Kernel;
use crate::process::context::Transfer;
use crate::process::pcb::{Pid, ProcessState, QueueId};

impl<H: Hal> Kernel<H> {
    /// Move the current process from the ready queue to `queue` and pick a replacement
    pub fn block(&mut self, queue: QueueId) -> Result<Transfer, KernelError> {
        let current = self.current.ok_or(KernelError::NoCurrentProcess)?;

        self.critical(|k| {
            k.dequeue(QueueId::Ready, current);
            k.table[current].state = ProcessState::Blocked;
            k.enqueue_back(queue, current);
        });

        let next = self.pick();
        Ok(self.handoff(Some(current), next))
    }

    /// Move `pid` from `queue` back to the ready queue.
    /// Never switches; a higher-priority wakeup only requests a reschedule.
    pub fn unblock(&mut self, pid: Pid, queue: QueueId) {
        self.critical(|k| {
            k.dequeue(queue, pid);
            k.table[pid].state = ProcessState::Ready;
            k.enqueue_ready(pid);
        });

        if self.reschedule_pending {
            return;
        }
        if let Some(current) = self.current {
            let running = self.table[current].state == ProcessState::Running;
            if running
                && self.table[pid].effective_priority > self.table[current].effective_priority
            {
                self.request_reschedule();
            }
        }
    }

    /// Block the current process for `seconds`. Zero returns immediately.
    pub fn sleep(&mut self, seconds: u32) -> Result<Transfer, KernelError> {
        let current = self.current.ok_or(KernelError::NoCurrentProcess)?;
        if seconds == 0 {
            return Ok(Transfer::Continue);
        }

        self.table[current].remaining_ticks = self.config.sleep_ticks(seconds);
        crate::serial_println!(
            "[PROC] PID {} sleeping for {} ticks",
            current,
            self.table[current].remaining_ticks
        );
        self.block(QueueId::Sleeping)
    }

    /// Block until the last live child terminates
    pub fn wait_for_children(&mut self) -> Result<Transfer, KernelError> {
        let current = self.current.ok_or(KernelError::NoCurrentProcess)?;
        if self.table[current].children == 0 {
            return Err(KernelError::NoChildren);
        }
        crate::serial_println!(
            "[PROC] PID {} waiting for {} children",
            current,
            self.table[current].children
        );
        self.block(QueueId::Waiting)
    }

    /// Count down every sleeper, waking those that reach zero
    pub(crate) fn advance_sleepers(&mut self) {
        let mut cursor = self.sleeping.head();
        while let Some(pid) = cursor {
            cursor = self.table[pid].next;

            let pcb = &mut self.table[pid];
            pcb.remaining_ticks = pcb.remaining_ticks.saturating_sub(1);
            if pcb.remaining_ticks == 0 {
                self.unblock(pid, QueueId::Sleeping);
            }
        }
    }
}
