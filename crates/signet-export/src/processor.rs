//! Chunk processor: the state machine that moves an export job forward.
//!
//! Each invocation handles exactly one `(job, chunk_index)` pair, persists
//! the result, and only then enqueues the continuation. A task whose index
//! no longer matches the job's `chunks_done` is stale by definition and is
//! dropped without side effects, so replays and races degrade to no-ops.

use std::sync::Arc;

use tracing::{debug, error, info};

use signet_core::result::AppResult;
use signet_database::repositories::{ExportJobRepository, SignatureRepository};
use signet_entity::job::{ExportJob, ExportJobStatus};
use signet_template::{SignatureRenderer, TemplateStore};

use crate::artifacts::{self, ArtifactStore};
use crate::runner::ExportQueue;

/// Outcome of one chunk-processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The task no longer applies: unknown job, terminal status, stale
    /// chunk index, or a lost save race. Nothing was changed.
    Skipped,
    /// The chunk was persisted and the continuation enqueued.
    Continued,
    /// The job reached `Completed`.
    Completed,
}

/// Executes export chunks one at a time.
#[derive(Debug, Clone)]
pub struct ChunkProcessor {
    /// Durable job state.
    job_repo: Arc<ExportJobRepository>,
    /// Source of the signature pages.
    signature_repo: Arc<SignatureRepository>,
    /// Sandboxed template loader.
    templates: Arc<TemplateStore>,
    /// Placeholder substitution.
    renderer: SignatureRenderer,
    /// Partial archive spool.
    artifacts: Arc<ArtifactStore>,
    /// Queue for continuations.
    queue: ExportQueue,
}

impl ChunkProcessor {
    /// Create a new chunk processor.
    pub fn new(
        job_repo: Arc<ExportJobRepository>,
        signature_repo: Arc<SignatureRepository>,
        templates: Arc<TemplateStore>,
        renderer: SignatureRenderer,
        artifacts: Arc<ArtifactStore>,
        queue: ExportQueue,
    ) -> Self {
        Self {
            job_repo,
            signature_repo,
            templates,
            renderer,
            artifacts,
            queue,
        }
    }

    /// Process one chunk of one job.
    ///
    /// Any failure past the guards marks the job `Failed` before the error
    /// is returned; per-job errors never take the worker down.
    pub async fn process_chunk(&self, job_id: &str, chunk_index: i64) -> AppResult<ChunkOutcome> {
        let Some(job) = self.job_repo.find_by_id(job_id).await? else {
            debug!(job_id, chunk = chunk_index, "Chunk task for unknown job, dropping");
            return Ok(ChunkOutcome::Skipped);
        };

        if job.status.is_terminal() {
            debug!(job_id, status = %job.status, "Job already terminal, dropping chunk task");
            return Ok(ChunkOutcome::Skipped);
        }

        if chunk_index != job.chunks_done {
            // Behind means the chunk is already reflected in the job;
            // ahead means the task outran its predecessor. Neither may
            // produce output.
            debug!(
                job_id,
                chunk = chunk_index,
                chunks_done = job.chunks_done,
                "Chunk index out of step, dropping"
            );
            return Ok(ChunkOutcome::Skipped);
        }

        match self.run_chunk(&job, chunk_index).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(job_id, chunk = chunk_index, error = %e, "Chunk processing failed");
                if let Err(mark_err) = self.job_repo.mark_failed(job_id, &e.to_string()).await {
                    error!(job_id, error = %mark_err, "Failed to record job failure");
                }
                Err(e)
            }
        }
    }

    async fn run_chunk(&self, job: &ExportJob, chunk_index: i64) -> AppResult<ChunkOutcome> {
        let page = self
            .signature_repo
            .page_for_export(
                job.owner_id,
                job.snapshot_at,
                job.chunk_size,
                chunk_index * job.chunk_size,
            )
            .await?;

        if page.is_empty() {
            // The signature set shrank after planning. An exhausted query
            // is completion, not a failure.
            if self.job_repo.mark_completed(&job.id, job.chunks_done).await? {
                info!(
                    job_id = %job.id,
                    chunks_done = job.chunks_done,
                    "Export completed on exhausted chunk"
                );
                return Ok(ChunkOutcome::Completed);
            }
            debug!(job_id = %job.id, "Lost completion race, dropping chunk task");
            return Ok(ChunkOutcome::Skipped);
        }

        let mut entries = Vec::with_capacity(page.len());
        for signature in &page {
            let template = self.templates.load(&signature.template).await?;
            let html = self.renderer.render(&template, signature);
            entries.push((artifacts::entry_name(signature), html));
        }

        let artifact = self
            .artifacts
            .write_partial(&job.id, chunk_index, entries)
            .await?;

        let mut artifact_list = job.partial_artifacts.0.clone();
        artifact_list.push(artifact);
        let finished = chunk_index + 1 >= job.chunks_total;
        let new_status = if finished {
            ExportJobStatus::Completed
        } else {
            ExportJobStatus::Processing
        };

        let advanced = self
            .job_repo
            .advance_chunk(&job.id, job.chunks_done, &artifact_list, new_status)
            .await?;
        if !advanced {
            debug!(job_id = %job.id, chunk = chunk_index, "Lost save race, discarding chunk result");
            return Ok(ChunkOutcome::Skipped);
        }

        if finished {
            info!(job_id = %job.id, chunks = job.chunks_total, "Export job completed");
            return Ok(ChunkOutcome::Completed);
        }

        self.queue.enqueue(&job.id, chunk_index + 1);
        Ok(ChunkOutcome::Continued)
    }
}
