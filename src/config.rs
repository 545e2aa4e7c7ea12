// Kernel configuration for the minikernel scheduler
use crate::process::Pid;

/// Number of process table slots
pub const MAX_PROC: usize = 10;

/// Size of each process stack in bytes
pub const STACK_SIZE: usize = 32768;

/// Timer interrupts per second
pub const TICKS_PER_SECOND: u32 = 100;

pub const MIN_PRIO: i32 = 1;
pub const MAX_PRIO: i32 = 50;

/// Slot of the root process that adopts orphaned children
pub const INIT_PID: Pid = 0;

/// Keyboard data port read on terminal interrupts
pub const TERMINAL_PORT: u16 = 0x60;

/// Multiplier applied to a waiting parent when its last child exits
pub const CHILD_EXIT_BONUS: f64 = 1.1;

pub const NUM_SYSCALLS: usize = 8;

// Syscall register file layout
pub const REG_SYSCALL: usize = 0;
pub const REG_ARG1: usize = 1;
pub const REG_ARG2: usize = 2;

/// Runtime scheduler tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedConfig {
    pub ticks_per_second: u32,
    pub child_exit_bonus: f64,
    pub stack_size: usize,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: TICKS_PER_SECOND,
            child_exit_bonus: CHILD_EXIT_BONUS,
            stack_size: STACK_SIZE,
        }
    }
}

impl SchedConfig {
    /// Ticks a process sleeps for the given number of seconds
    pub fn sleep_ticks(&self, seconds: u32) -> u32 {
        seconds.saturating_mul(self.ticks_per_second)
    }
}
