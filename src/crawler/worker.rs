//! Frontier worker pool
//!
//! Each worker pulls one record at a time from the local work queue, runs it
//! through the orchestrator in its own task and acknowledges it afterwards.
//! A panic while processing a record is logged and written to the crawl
//! status; the worker moves on to the next record.

use crate::crawler::Orchestrator;
use crate::queue::LocalWorkQueue;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    stop: CancellationToken,
}

impl WorkerPool {
    /// Spawns `workers` consumers on the current runtime
    pub fn start(orchestrator: Arc<Orchestrator>, queue: Arc<LocalWorkQueue>, workers: usize) -> Self {
        let stop = CancellationToken::new();
        let handles = (0..workers.max(1))
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&orchestrator),
                    Arc::clone(&queue),
                    stop.clone(),
                ))
            })
            .collect();

        tracing::debug!("Started {} frontier workers", workers.max(1));
        Self { handles, stop }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Stops taking new records and waits for in-flight ones to finish
    pub async fn stop(self) {
        self.stop.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Frontier worker panicked: {}", e);
            }
        }
    }
}

async fn run_worker(
    worker_id: usize,
    orchestrator: Arc<Orchestrator>,
    queue: Arc<LocalWorkQueue>,
    stop: CancellationToken,
) {
    loop {
        let record = tokio::select! {
            _ = stop.cancelled() => break,
            next = queue.receive() => match next {
                Some(record) => record,
                None => break,
            },
        };

        let crawl_id = record.crawl_id.clone();
        let url = record.url.clone();
        let task_orchestrator = Arc::clone(&orchestrator);
        let result = tokio::spawn(async move { task_orchestrator.process_record(&record).await }).await;

        match result {
            Ok(outcome) => {
                tracing::trace!("Worker {} finished {}: {:?}", worker_id, url, outcome);
            }
            Err(e) => {
                tracing::error!("Worker {} failed on {}: {}", worker_id, url, e);
                orchestrator.record_error(&crawl_id, format!("Unexpected failure processing {}: {}", url, e));
            }
        }
        queue.ack();
    }
    tracing::trace!("Worker {} exiting", worker_id);
}
