// Process management for the minikernel
pub mod blocking;
pub mod context;
pub mod lifecycle;
pub mod pcb;
pub mod queue;
pub mod scheduler;
pub mod stats;
pub mod table;

pub use context::Transfer;
pub use pcb::{Pcb, Pid, ProcessState, QueueId};
pub use queue::ProcQueue;
pub use stats::SystemStats;
pub use table::ProcessTable;
