// Priority-with-aging scheduler
use crate::config::{MAX_PRIO, MIN_PRIO};
use crate::error::KernelError;
use crate::hal::{Hal, Interrupt, InterruptLevel};
use crate::kernel::Kernel;
use crate::process::context::Transfer;
use crate::process::pcb::{Pid, ProcessState, QueueId};

impl<H: Hal> Kernel<H> {
    /// Choose the next process to run. The chosen process stays in the ready queue.
    ///
    /// Idles with minimal masking while nothing is ready. When the head has
    /// exhausted its effective priority every process is renormalized first.
    pub fn pick(&mut self) -> Pid {
        let head = loop {
            if let Some(head) = self.ready.head() {
                break head;
            }
            self.idle();
        };

        if self.table[head].effective_priority == 0 {
            self.renormalize();
        }
        self.ready.head().unwrap_or(head)
    }

    /// Wait for one interrupt with only software interrupts masked
    fn idle(&mut self) {
        let previous = self.hal.set_interrupt_level(InterruptLevel::Software);
        let woken_by = self.hal.halt_cpu();
        self.hal.set_interrupt_level(previous);

        match woken_by {
            Some(Interrupt::Timer) => self.on_tick(),
            Some(Interrupt::Terminal) => self.on_terminal(),
            Some(other) => crate::serial_println!("[SCHED] Ignoring {:?} while idle", other),
            None => {}
        }
    }

    /// effective := floor(effective / 2) + base for every used slot
    pub fn renormalize(&mut self) {
        self.renormalizations += 1;
        crate::serial_println!("[SCHED] Renormalizing priorities");

        self.critical(|k| {
            for pid in 0..crate::config::MAX_PROC {
                let pcb = &mut k.table[pid];
                if pcb.state == ProcessState::Unused {
                    continue;
                }
                let renormalized = pcb.effective_priority.div_euclid(2) + pcb.base_priority;
                k.apply_effective_priority(pid, renormalized);
            }
        });
    }

    /// Age the running process by one tick
    pub fn decay_current(&mut self) {
        let Some(current) = self.current else {
            return;
        };
        if self.table[current].state != ProcessState::Running {
            return;
        }

        let decayed = self.table[current].effective_priority - 1;
        self.apply_effective_priority(current, decayed);

        if decayed <= 0 && self.pick() != current {
            self.request_reschedule();
        }
    }

    /// Change the base priority of `pid`, scaling its effective priority to match
    pub fn set_base_priority(&mut self, pid: Pid, priority: i32) -> Result<(), KernelError> {
        if !(MIN_PRIO..=MAX_PRIO).contains(&priority) {
            return Err(KernelError::InvalidPriority);
        }

        let old_base = self.table[pid].base_priority;
        let old_effective = self.table[pid].effective_priority;
        let factor = if priority >= old_base {
            f64::from(priority + old_base) / f64::from(2 * old_base)
        } else {
            f64::from(priority) / f64::from(old_base)
        };
        let effective = (f64::from(old_effective) * factor) as i32;

        crate::serial_println!(
            "[SCHED] PID {} base priority {} -> {}, effective {} -> {}",
            pid, old_base, priority, old_effective, effective
        );
        self.table[pid].base_priority = priority;
        self.apply_effective_priority(pid, effective);
        self.dump_queue(QueueId::Ready);
        self.dump_queue(QueueId::Sleeping);

        if effective < old_effective && self.pick() != pid && !self.reschedule_pending {
            self.request_reschedule();
        }
        Ok(())
    }

    /// Software interrupt: carry out a pending reschedule
    pub fn replan(&mut self) -> Transfer {
        if !self.reschedule_pending {
            return Transfer::Continue;
        }

        self.dump_queue(QueueId::Ready);
        self.dump_queue(QueueId::Sleeping);

        let next = self.pick();
        let Some(current) = self.current else {
            return self.handoff(None, next);
        };
        if next == current {
            self.reschedule_pending = false;
            return Transfer::Continue;
        }

        if self.table[current].state == ProcessState::Running {
            self.table[current].state = ProcessState::Ready;
        }
        crate::serial_println!("[SCHED] Preempting PID {} for PID {}", current, next);
        self.handoff(Some(current), next)
    }

    /// Make `to` the running process. Any pending reschedule is settled by this choice.
    pub(crate) fn handoff(&mut self, from: Option<Pid>, to: Pid) -> Transfer {
        debug_assert_eq!(self.table[to].queue, Some(QueueId::Ready));
        self.table[to].state = ProcessState::Running;
        self.current = Some(to);
        self.reschedule_pending = false;

        if from == Some(to) {
            return Transfer::Continue;
        }
        self.context_switches += 1;
        Transfer::SwitchTo { from, to }
    }
}
