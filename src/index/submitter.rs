//! Background indexing pool
//!
//! Documents go into a bounded channel drained by a fixed number of tasks.
//! Submission never waits: a full channel is reported back to the caller,
//! and indexing failures are logged and counted, never propagated.

use crate::index::{IndexError, SearchIndex};
use crate::model::UrlSearchDoc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct SubmitStats {
    indexed: AtomicU64,
    failed: AtomicU64,
}

/// Bounded-concurrency, fire-and-forget document submitter
pub struct IndexSubmitter {
    sender: Mutex<Option<mpsc::Sender<UrlSearchDoc>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<SubmitStats>,
}

impl IndexSubmitter {
    /// Spawns `workers` submission tasks sharing a queue of `capacity` documents
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(index: Arc<dyn SearchIndex>, workers: usize, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let stats = Arc::new(SubmitStats::default());

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let index = Arc::clone(&index);
                let receiver = Arc::clone(&receiver);
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(doc) = next else {
                            break;
                        };
                        match index.index_document(&doc).await {
                            Ok(()) => {
                                stats.indexed.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                stats.failed.fetch_add(1, Ordering::Relaxed);
                                tracing::error!("Failed to index {}: {}", doc.url, e);
                            }
                        }
                    }
                    tracing::trace!("Index worker {} finished", worker_id);
                })
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
            stats,
        }
    }

    /// Enqueues a document without waiting
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The document is queued
    /// * `Err(IndexError::QueueFull)` - Every slot is taken
    /// * `Err(IndexError::Closed)` - The submitter was shut down
    pub fn submit(&self, doc: UrlSearchDoc) -> Result<(), IndexError> {
        let guard = self.sender.lock().map_err(|_| IndexError::Closed)?;
        let sender = guard.as_ref().ok_or(IndexError::Closed)?;
        sender.try_send(doc).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => IndexError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => IndexError::Closed,
        })
    }

    /// Documents indexed successfully so far
    pub fn indexed(&self) -> u64 {
        self.stats.indexed.load(Ordering::Relaxed)
    }

    /// Documents the index rejected or that failed in transit
    pub fn failed(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }

    /// Stops accepting documents and waits for queued ones to drain
    pub async fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Index worker panicked: {}", e);
            }
        }
        tracing::info!(
            "Indexing drained: {} indexed, {} failed",
            self.indexed(),
            self.failed()
        );
    }
}
