// Minikernel: priority-with-aging process scheduler for a single-CPU teaching kernel
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod hal;
pub mod serial;

#[cfg(target_arch = "x86_64")]
pub mod arch;

pub mod interrupts;
pub mod kernel;
pub mod process;
pub mod syscalls;

#[cfg(test)]
pub mod testing;

#[cfg(test)]
mod tests;

pub use error::KernelError;
pub use kernel::Kernel;
pub use process::{Pid, ProcessState, QueueId, Transfer};
