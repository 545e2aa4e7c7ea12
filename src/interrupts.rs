// Interrupt dispatch for the minikernel
use crate::config::TERMINAL_PORT;
use crate::error::KernelError;
use crate::hal::{Hal, Interrupt};
use crate::kernel::Kernel;
use crate::process::Transfer;

impl<H: Hal> Kernel<H> {
    /// Entry point for every interrupt, exception and syscall.
    /// Performs the resulting transfer before returning it.
    pub fn dispatch(&mut self, interrupt: Interrupt) -> Transfer {
        let transfer = match interrupt {
            Interrupt::Timer => {
                self.on_tick();
                Transfer::Continue
            }
            Interrupt::Terminal => {
                self.on_terminal();
                Transfer::Continue
            }
            Interrupt::Software => self.replan(),
            Interrupt::Syscall => self.handle_syscall(),
            Interrupt::ArithmeticFault | Interrupt::MemoryFault => self.on_exception(interrupt),
        };
        self.perform(transfer);
        transfer
    }

    /// Timer tick: age the running process, then count down sleepers
    pub(crate) fn on_tick(&mut self) {
        self.ticks += 1;
        self.decay_current();
        self.advance_sleepers();
    }

    pub(crate) fn on_terminal(&mut self) {
        let byte = self.hal.read_port(TERMINAL_PORT);
        crate::serial_println!("[TERM] Scancode 0x{:02x}", byte);
    }

    /// Faults in user code kill the process. Faults in the kernel are fatal.
    fn on_exception(&mut self, interrupt: Interrupt) -> Transfer {
        if !self.hal.from_user_mode() {
            panic!("[FAULT] {}: {:?}", KernelError::FatalKernelFault, interrupt);
        }

        crate::serial_println!("[FAULT] {:?} in PID {:?}, terminating", interrupt, self.current);
        match self.terminate_current() {
            Ok(transfer) => transfer,
            Err(err) => panic!("[FAULT] {}: {:?}", err, interrupt),
        }
    }
}
