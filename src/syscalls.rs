// System call table for the minikernel
use crate::config::{REG_ARG1, REG_ARG2, REG_SYSCALL};
use crate::error::KernelError;
use crate::hal::Hal;
use crate::kernel::Kernel;
use crate::process::Transfer;

/// System call numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum SyscallNumber {
    Create = 0,
    Terminate = 1,
    Write = 2,
    GetPid = 3,
    Sleep = 4,
    SetPriority = 5,
    GetParentPid = 6,
    WaitChildren = 7,
}

impl TryFrom<usize> for SyscallNumber {
    type Error = KernelError;

    fn try_from(number: usize) -> Result<Self, KernelError> {
        match number {
            0 => Ok(SyscallNumber::Create),
            1 => Ok(SyscallNumber::Terminate),
            2 => Ok(SyscallNumber::Write),
            3 => Ok(SyscallNumber::GetPid),
            4 => Ok(SyscallNumber::Sleep),
            5 => Ok(SyscallNumber::SetPriority),
            6 => Ok(SyscallNumber::GetParentPid),
            7 => Ok(SyscallNumber::WaitChildren),
            _ => Err(KernelError::UnknownSyscall),
        }
    }
}

/// System call result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallResult {
    Success(isize),
    Error(KernelError),
}

impl From<Result<isize, KernelError>> for SyscallResult {
    fn from(result: Result<isize, KernelError>) -> Self {
        match result {
            Ok(value) => SyscallResult::Success(value),
            Err(err) => SyscallResult::Error(err),
        }
    }
}

/// Value placed in the return register. Every error is -1.
impl From<SyscallResult> for isize {
    fn from(result: SyscallResult) -> isize {
        match result {
            SyscallResult::Success(value) => value,
            SyscallResult::Error(_) => -1,
        }
    }
}

impl<H: Hal> Kernel<H> {
    /// Decode the syscall registers, run the call and store its result.
    /// The result is written before any switch so a blocked caller finds it on resume.
    pub fn handle_syscall(&mut self) -> Transfer {
        let number = self.hal.read_register(REG_SYSCALL);

        let (result, transfer) = match SyscallNumber::try_from(number) {
            Ok(call) => self.run_syscall(call),
            Err(err) => {
                crate::serial_println!("[SYSCALL] Unknown syscall {}", number);
                (Some(Err(err)), Transfer::Continue)
            }
        };

        // Terminate has no caller left to return to
        if let Some(result) = result {
            let result = SyscallResult::from(result);
            if let SyscallResult::Error(err) = result {
                crate::serial_println!("[SYSCALL] {} failed: {}", number, err);
            }
            self.hal.write_register(REG_SYSCALL, isize::from(result) as usize);
        }
        transfer
    }

    fn run_syscall(
        &mut self,
        call: SyscallNumber,
    ) -> (Option<Result<isize, KernelError>>, Transfer) {
        let arg1 = self.hal.read_register(REG_ARG1);
        match call {
            SyscallNumber::Create => (Some(self.sys_create(arg1)), Transfer::Continue),
            SyscallNumber::Terminate => match self.terminate_current() {
                Ok(transfer) => (None, transfer),
                Err(err) => (Some(Err(err)), Transfer::Continue),
            },
            SyscallNumber::Write => {
                let len = self.hal.read_register(REG_ARG2);
                self.hal.write_text(arg1, len);
                (Some(Ok(0)), Transfer::Continue)
            }
            SyscallNumber::GetPid => (Some(self.sys_get_pid()), Transfer::Continue),
            SyscallNumber::GetParentPid => (Some(self.sys_get_parent_pid()), Transfer::Continue),
            SyscallNumber::Sleep => {
                // the argument is an unsigned 32-bit count of seconds
                Self::blocking_call(self.sleep(arg1 as u32))
            }
            SyscallNumber::SetPriority => {
                (Some(self.sys_set_priority(arg1 as isize)), Transfer::Continue)
            }
            SyscallNumber::WaitChildren => Self::blocking_call(self.wait_for_children()),
        }
    }

    /// Calls that may block report 0 once the caller runs again
    fn blocking_call(
        result: Result<Transfer, KernelError>,
    ) -> (Option<Result<isize, KernelError>>, Transfer) {
        match result {
            Ok(transfer) => (Some(Ok(0)), transfer),
            Err(err) => (Some(Err(err)), Transfer::Continue),
        }
    }

    fn sys_create(&mut self, program: usize) -> Result<isize, KernelError> {
        crate::serial_println!("[SYSCALL] Create program {}", program);
        self.create(program).map(|pid| pid as isize)
    }

    fn sys_get_pid(&self) -> Result<isize, KernelError> {
        self.current
            .map(|pid| pid as isize)
            .ok_or(KernelError::NoCurrentProcess)
    }

    /// Orphans report -1
    fn sys_get_parent_pid(&self) -> Result<isize, KernelError> {
        let current = self.current.ok_or(KernelError::NoCurrentProcess)?;
        Ok(self.table[current].parent.map_or(-1, |pid| pid as isize))
    }

    fn sys_set_priority(&mut self, priority: isize) -> Result<isize, KernelError> {
        let current = self.current.ok_or(KernelError::NoCurrentProcess)?;
        let priority = i32::try_from(priority).map_err(|_| KernelError::InvalidPriority)?;
        self.set_base_priority(current, priority).map(|()| 0)
    }
}
