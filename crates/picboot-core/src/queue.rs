//! The command FIFO shared between callers (producers) and the pump
//! (sole consumer).

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

/// One pending transmission: the payload to send and how long the pump
/// should wait after sending it before touching the transport again.
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// Frame payload, opcode byte first.
    pub payload: Vec<u8>,
    /// Settle time to sleep after this command is sent.
    pub settle: Duration,
}

/// A cheaply-cloneable, mutex-guarded FIFO. Any number of producers may
/// push; only the pump pops.
#[derive(Debug, Clone, Default)]
pub struct TxQueue {
    inner: Arc<Mutex<VecDeque<QueueItem>>>,
}

impl TxQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `item` to the back of the queue.
    pub fn push(&self, item: QueueItem) {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.push_back(item);
    }

    /// Removes and returns the item at the front of the queue, if any.
    pub fn pop(&self) -> Option<QueueItem> {
        let mut guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.pop_front()
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        let guard = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.len()
    }

    /// True if no commands are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
