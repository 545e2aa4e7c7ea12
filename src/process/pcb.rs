// Process Control Block (PCB) for the minikernel
use crate::hal::Hal;

/// Process ID type. Equals the table slot while the process is alive.
pub type Pid = usize;

/// Process state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Unused,     // Free table slot
    Ready,      // In the ready queue, waiting for CPU
    Running,    // Currently executing (still linked in the ready queue)
    Blocked,    // Sleeping or waiting for children
    Terminated, // Resources released, slot not yet reaped
}

/// Queues a PCB can be linked into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueId {
    Ready,
    Sleeping,
    Waiting,
}

/// Process Control Block
pub struct Pcb<H: Hal> {
    pub id: Pid,
    /// Creator, or `None` for an orphan
    pub parent: Option<Pid>,
    pub state: ProcessState,
    pub base_priority: i32,
    pub effective_priority: i32,
    /// Sleep countdown, meaningful only while in the sleep queue
    pub remaining_ticks: u32,
    /// Live children
    pub children: usize,
    pub image: Option<H::Image>,
    pub stack: Option<H::Stack>,
    pub context: Option<H::Context>,
    pub(crate) next: Option<Pid>,
    pub(crate) queue: Option<QueueId>,
}

impl<H: Hal> Pcb<H> {
    pub fn unused(id: Pid) -> Self {
        Self {
            id,
            parent: None,
            state: ProcessState::Unused,
            base_priority: 0,
            effective_priority: 0,
            remaining_ticks: 0,
            children: 0,
            image: None,
            stack: None,
            context: None,
            next: None,
            queue: None,
        }
    }

    /// Alive and schedulable at some point: not a free slot, not torn down
    pub fn is_live(&self) -> bool {
        !matches!(self.state, ProcessState::Unused | ProcessState::Terminated)
    }

    /// Queue this PCB is currently linked into
    pub fn queue(&self) -> Option<QueueId> {
        self.queue
    }
}
