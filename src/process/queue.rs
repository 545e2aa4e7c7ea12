// Intrusive process queues linked through the process table
use crate::hal::Hal;
use crate::process::pcb::{Pid, QueueId};
use crate::process::table::ProcessTable;

/// Singly-linked queue of table indices. Links live in the PCBs.
#[derive(Debug, Clone, Copy)]
pub struct ProcQueue {
    id: QueueId,
    head: Option<Pid>,
    tail: Option<Pid>,
    len: usize,
}

impl ProcQueue {
    pub const fn new(id: QueueId) -> Self {
        Self {
            id,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn head(&self) -> Option<Pid> {
        self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Append at the tail (FIFO)
    pub fn push_back<H: Hal>(&mut self, table: &mut ProcessTable<H>, pid: Pid) {
        debug_assert!(table[pid].queue.is_none(), "pid {} already queued", pid);
        table[pid].next = None;
        table[pid].queue = Some(self.id);
        match self.tail {
            Some(tail) => table[tail].next = Some(pid),
            None => self.head = Some(pid),
        }
        self.tail = Some(pid);
        self.len += 1;
    }

    /// Insert by descending effective priority, after any equal entries
    pub fn insert_ordered<H: Hal>(&mut self, table: &mut ProcessTable<H>, pid: Pid) {
        debug_assert!(table[pid].queue.is_none(), "pid {} already queued", pid);
        let priority = table[pid].effective_priority;

        let mut prev = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            if table[current].effective_priority < priority {
                break;
            }
            prev = Some(current);
            cursor = table[current].next;
        }

        table[pid].next = cursor;
        table[pid].queue = Some(self.id);
        match prev {
            Some(prev) => table[prev].next = Some(pid),
            None => self.head = Some(pid),
        }
        if cursor.is_none() {
            self.tail = Some(pid);
        }
        self.len += 1;
    }

    /// Unlink `pid`. Returns false if it is not in this queue.
    pub fn remove<H: Hal>(&mut self, table: &mut ProcessTable<H>, pid: Pid) -> bool {
        if table[pid].queue != Some(self.id) {
            return false;
        }

        let mut prev = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            if current == pid {
                let next = table[current].next;
                match prev {
                    Some(prev) => table[prev].next = next,
                    None => self.head = next,
                }
                if self.tail == Some(pid) {
                    self.tail = prev;
                }
                table[pid].next = None;
                table[pid].queue = None;
                self.len -= 1;
                return true;
            }
            prev = Some(current);
            cursor = table[current].next;
        }
        false
    }

    pub fn contains<H: Hal>(&self, table: &ProcessTable<H>, pid: Pid) -> bool {
        self.iter(table).any(|queued| queued == pid)
    }

    pub fn iter<'a, H: Hal>(&self, table: &'a ProcessTable<H>) -> QueueIter<'a, H> {
        QueueIter {
            table,
            cursor: self.head,
        }
    }
}

/// Walks a queue front to back
pub struct QueueIter<'a, H: Hal> {
    table: &'a ProcessTable<H>,
    cursor: Option<Pid>,
}

impl<'a, H: Hal> Iterator for QueueIter<'a, H> {
    type Item = Pid;

    fn next(&mut self) -> Option<Pid> {
        let pid = self.cursor?;
        self.cursor = self.table[pid].next;
        Some(pid)
    }
}
