// Kernel error kinds
use core::fmt;

/// Failures reported by kernel operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    ResourceExhausted,
    ImageCreationFailed,
    InvalidPriority,
    NoChildren,
    UnknownSyscall,
    FatalKernelFault,
    NoCurrentProcess,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KernelError::ResourceExhausted => write!(f, "No free process slot"),
            KernelError::ImageCreationFailed => write!(f, "Could not build program image"),
            KernelError::InvalidPriority => write!(f, "Priority out of range"),
            KernelError::NoChildren => write!(f, "Process has no children"),
            KernelError::UnknownSyscall => write!(f, "Unknown syscall number"),
            KernelError::FatalKernelFault => write!(f, "Exception raised in kernel mode"),
            KernelError::NoCurrentProcess => write!(f, "No current process"),
        }
    }
}
