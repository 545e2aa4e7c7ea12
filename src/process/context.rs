// Context transfer between processes
use crate::hal::Hal;
use crate::kernel::Kernel;
use crate::process::pcb::{Pid, ProcessState};

/// Outcome of a kernel operation with respect to the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Keep running the interrupted process
    Continue,
    /// Switch to `to`. `from = None` means there is nothing to save.
    SwitchTo { from: Option<Pid>, to: Pid },
}

impl<H: Hal> Kernel<H> {
    /// Carry out a transfer. This is the only caller of `switch_context`.
    ///
    /// A terminated outgoing process is reaped here: its context is discarded
    /// and its slot returns to the free pool before the switch.
    pub fn perform(&mut self, transfer: Transfer) {
        let Transfer::SwitchTo { from, to } = transfer else {
            return;
        };

        match from {
            Some(old) if self.table[old].state == ProcessState::Terminated => {
                self.table.reap(old);
                self.switch_fresh(to);
            }
            Some(old) => {
                let Some((outgoing, incoming)) = self.table.pair_mut(old, to) else {
                    return;
                };
                let Some(target) = incoming.context.as_ref() else {
                    crate::serial_println!("[SCHED] PID {} has no context", to);
                    return;
                };
                self.hal.switch_context(outgoing.context.as_mut(), target);
            }
            None => self.switch_fresh(to),
        }
    }

    fn switch_fresh(&mut self, to: Pid) {
        match self.table[to].context.as_ref() {
            Some(target) => self.hal.switch_context(None, target),
            None => crate::serial_println!("[SCHED] PID {} has no context", to),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::process::pcb::QueueId;
    use crate::testing::{booted, spawn, MockHal, INIT_PROGRAM};
    use crate::{Kernel, Transfer};

    #[test]
    fn continue_does_not_switch() {
        let mut kernel = booted();
        let before = kernel.hal.switches.len();
        kernel.perform(Transfer::Continue);
        assert_eq!(kernel.hal.switches.len(), before);
    }

    #[test]
    fn boot_performs_single_unsaved_switch() {
        let mut kernel = Kernel::new(MockHal::new());
        let transfer = kernel.boot(INIT_PROGRAM).expect("init boots");
        assert_eq!(transfer, Transfer::SwitchTo { from: None, to: 0 });

        let init_ctx = kernel.table[0].context.as_ref().map(|c| c.id);
        assert_eq!(kernel.hal.switches, vec![(None, init_ctx.expect("context"))]);
    }

    #[test]
    fn blocking_switch_saves_outgoing_context() {
        let mut kernel = booted();
        let child = spawn(&mut kernel);

        let transfer = kernel.block(QueueId::Waiting).expect("running process");
        kernel.perform(transfer);

        let ctx = |pid: usize| kernel.table[pid].context.as_ref().map(|c| c.id);
        let last = kernel.hal.switches.last().copied();
        assert_eq!(last, Some((ctx(0), ctx(child).expect("context"))));
        assert_eq!(kernel.table[0].context.as_ref().map(|c| c.saves), Some(1));
    }
}
