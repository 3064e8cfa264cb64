//! Export worker: an explicit task queue and the loop that drains it.
//!
//! Continuations go through this queue instead of recursing inside the
//! processor, so every chunk starts from persisted state and the queue
//! depth stays observable. A single worker task drains the queue, which
//! keeps chunk execution strictly sequential.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::processor::ChunkProcessor;

/// One unit of export work: a single chunk of a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTask {
    /// Job identifier.
    pub job_id: String,
    /// Chunk to process; must equal the job's current `chunks_done`.
    pub chunk_index: i64,
}

/// Sending half of the export queue.
#[derive(Debug, Clone)]
pub struct ExportQueue {
    tx: mpsc::UnboundedSender<ChunkTask>,
}

impl ExportQueue {
    /// Enqueue one chunk task.
    ///
    /// Sending only fails while the worker is shutting down; the task is
    /// dropped and the job is left for the retention sweep.
    pub fn enqueue(&self, job_id: &str, chunk_index: i64) {
        let task = ChunkTask {
            job_id: job_id.to_string(),
            chunk_index,
        };
        if self.tx.send(task).is_err() {
            warn!(job_id, chunk = chunk_index, "Export queue closed, dropping chunk task");
        }
    }
}

/// Create the export queue pair.
pub fn export_queue() -> (ExportQueue, mpsc::UnboundedReceiver<ChunkTask>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ExportQueue { tx }, rx)
}

/// Background task that executes queued chunk tasks one at a time.
pub struct ExportWorker {
    processor: Arc<ChunkProcessor>,
    rx: mpsc::UnboundedReceiver<ChunkTask>,
}

impl std::fmt::Debug for ExportWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportWorker").finish()
    }
}

impl ExportWorker {
    /// Create a worker over the receiving half of the export queue.
    pub fn new(processor: Arc<ChunkProcessor>, rx: mpsc::UnboundedReceiver<ChunkTask>) -> Self {
        Self { processor, rx }
    }

    /// Drain the queue until the cancel signal flips or the queue closes.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        info!("Export worker started");

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Export worker received shutdown signal");
                        break;
                    }
                }
                task = self.rx.recv() => {
                    let Some(task) = task else {
                        break;
                    };
                    if let Err(e) = self
                        .processor
                        .process_chunk(&task.job_id, task.chunk_index)
                        .await
                    {
                        error!(
                            job_id = %task.job_id,
                            chunk = task.chunk_index,
                            error = %e,
                            "Chunk task failed"
                        );
                    }
                }
            }
        }

        info!("Export worker shut down");
    }
}
