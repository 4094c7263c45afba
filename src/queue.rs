//! Work channel carrying frontier records between workers
//!
//! The orchestrator only needs the producer side ([`WorkQueue::publish`]).
//! [`LocalWorkQueue`] is the in-process channel: records are delivered in
//! publish order, and every delivery must be acknowledged once processing
//! finishes so the queue can tell when a crawl tree has gone quiet.

use crate::model::FrontierRecord;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex, Notify};

/// Errors raised by the work channel
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Work queue is closed")]
    Closed,
}

/// Producer side of the work channel
pub trait WorkQueue: Send + Sync {
    fn publish(&self, record: FrontierRecord) -> Result<(), QueueError>;
}

/// Unbounded in-process work channel with acknowledgement tracking
pub struct LocalWorkQueue {
    sender: mpsc::UnboundedSender<FrontierRecord>,
    receiver: Mutex<mpsc::UnboundedReceiver<FrontierRecord>>,
    /// Published but not yet acknowledged
    pending: AtomicUsize,
    idle: Notify,
}

impl LocalWorkQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            pending: AtomicUsize::new(0),
            idle: Notify::new(),
        }
    }

    /// Waits for the next record
    ///
    /// Concurrent callers are served one at a time, in publish order.
    pub async fn receive(&self) -> Option<FrontierRecord> {
        self.receiver.lock().await.recv().await
    }

    /// Marks one delivered record as fully processed
    pub fn ack(&self) {
        let previous = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        if previous <= 1 {
            self.idle.notify_waiters();
        }
    }

    /// Records queued or in flight
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Resolves once every published record has been acknowledged
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for LocalWorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue for LocalWorkQueue {
    fn publish(&self, record: FrontierRecord) -> Result<(), QueueError> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        if self.sender.send(record).is_err() {
            self.ack();
            return Err(QueueError::Closed);
        }
        Ok(())
    }
}
