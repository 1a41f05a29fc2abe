// Output queue - FIFO buffer of ready payloads
//
// Populated by `do_execute()`, drained one token at a time by the engine
// through `output()`. The queue can be detached wholesale for state backup
// and reattached on restore.

use std::collections::VecDeque;

use flow_types::Payload;

/// FIFO buffer of payloads awaiting drain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputQueue {
    items: VecDeque<Payload>,
}

impl OutputQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all buffered payloads
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Append one payload at the tail
    pub fn push(&mut self, payload: impl Into<Payload>) {
        self.items.push_back(payload.into());
    }

    /// Append a sequence of payloads, preserving order
    pub fn push_all(&mut self, payloads: impl IntoIterator<Item = Payload>) {
        self.items.extend(payloads);
    }

    /// Remove and return the head of the queue
    pub fn pop(&mut self) -> Option<Payload> {
        self.items.pop_front()
    }

    /// Number of buffered payloads
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move the queue out for backup, leaving an empty one behind
    pub fn detach(&mut self) -> OutputQueue {
        std::mem::take(self)
    }
}
