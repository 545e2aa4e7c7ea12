// Process creation and termination
use crate::config::{INIT_PID, MIN_PRIO};
use crate::error::KernelError;
use crate::hal::{Hal, ProgramRef};
use crate::kernel::Kernel;
use crate::process::context::Transfer;
use crate::process::pcb::{Pcb, Pid, ProcessState, QueueId};

impl<H: Hal> Kernel<H> {
    /// Create a process running `program`. The caller, if any, becomes its parent
    /// and splits its effective priority with it.
    pub fn create(&mut self, program: ProgramRef) -> Result<Pid, KernelError> {
        let pid = self.table.allocate_slot()?;

        let Some((image, entry)) = self.hal.build_image(program) else {
            crate::serial_println!("[PROC] Failed to build image for program {}", program);
            return Err(KernelError::ImageCreationFailed);
        };
        let stack_size = self.config.stack_size;
        let stack = self.hal.allocate_stack(stack_size);
        let context = self.hal.init_context(&image, &stack, stack_size, entry);

        let mut pcb = Pcb::unused(pid);
        pcb.state = ProcessState::Ready;
        pcb.image = Some(image);
        pcb.stack = Some(stack);
        pcb.context = Some(context);
        self.table[pid] = pcb;

        match self.current {
            Some(parent) => {
                self.table[parent].children += 1;
                self.table[pid].parent = Some(parent);
                self.table[pid].base_priority = self.table[parent].base_priority;

                let parent_pcb = &self.table[parent];
                let at_floor = parent_pcb.base_priority == MIN_PRIO
                    && parent_pcb.effective_priority <= MIN_PRIO;
                if !at_floor {
                    let halved = parent_pcb.effective_priority / 2;
                    self.apply_effective_priority(parent, halved);
                }
                self.table[pid].effective_priority = self.table[parent].effective_priority;
            }
            None => {
                self.table[pid].parent = None;
                self.table[pid].base_priority = MIN_PRIO;
                self.table[pid].effective_priority = MIN_PRIO;
            }
        }

        self.enqueue_ready(pid);
        crate::serial_println!(
            "[PROC] Created PID {} (parent {:?}, priority {}/{})",
            pid,
            self.table[pid].parent,
            self.table[pid].base_priority,
            self.table[pid].effective_priority
        );

        if let Some(parent) = self.current {
            if self.pick() != parent {
                self.request_reschedule();
            }
        }
        Ok(pid)
    }

    /// Tear down the current process and pick a replacement.
    /// The slot is reaped once the returned transfer is performed.
    pub fn terminate_current(&mut self) -> Result<Transfer, KernelError> {
        let current = self.current.ok_or(KernelError::NoCurrentProcess)?;
        crate::serial_println!("[PROC] Terminating PID {}", current);

        self.adopt_children(current);
        self.notify_parent(current);

        if let Some(image) = self.table[current].image.take() {
            self.hal.release_image(image);
        }
        if let Some(stack) = self.table[current].stack.take() {
            self.hal.release_stack(stack);
        }

        self.critical(|k| {
            k.dequeue(QueueId::Ready, current);
            k.table[current].state = ProcessState::Terminated;
        });
        if current == INIT_PID {
            self.init_alive = false;
        }

        let next = self.pick();
        Ok(self.handoff(Some(current), next))
    }

    /// Hand `pid`'s live children to init, or orphan them if init is gone
    fn adopt_children(&mut self, pid: Pid) {
        // A later process reusing slot INIT_PID is not init
        let adopter = (pid != INIT_PID && self.init_alive).then_some(INIT_PID);

        let mut adopted = 0;
        for pcb in self.table.iter_mut() {
            if pcb.is_live() && pcb.parent == Some(pid) {
                pcb.parent = adopter;
                adopted += 1;
            }
        }

        self.table[pid].children = 0;
        if let Some(init) = adopter {
            self.table[init].children += adopted;
        }
        if adopted > 0 {
            crate::serial_println!("[PROC] {} children of PID {} reparented to {:?}", adopted, pid, adopter);
        }
    }

    /// Drop `pid` from its parent's child count, waking a parent waiting on its last child
    fn notify_parent(&mut self, pid: Pid) {
        let Some(parent) = self.table[pid].parent else {
            return;
        };
        if !self.table[parent].is_live() {
            return;
        }

        let parent_pcb = &mut self.table[parent];
        parent_pcb.children = parent_pcb.children.saturating_sub(1);
        if parent_pcb.children > 0 || parent_pcb.queue != Some(QueueId::Waiting) {
            return;
        }

        let boosted = (f64::from(parent_pcb.effective_priority) * self.config.child_exit_bonus) as i32;
        crate::serial_println!(
            "[PROC] Last child of PID {} exited, priority {} -> {}",
            parent,
            parent_pcb.effective_priority,
            boosted
        );
        parent_pcb.effective_priority = boosted;
        self.unblock(parent, QueueId::Waiting);
    }
}
