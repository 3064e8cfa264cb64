//! Export job repository implementation.
//!
//! All mutation goes through guarded single-statement updates keyed on the
//! expected `chunks_done` value. Two workers racing on the same chunk
//! cannot both win: the loser's update matches zero rows and it backs off.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::types::Json;

use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;
use signet_entity::job::{ExportJob, ExportJobStatus, NewExportJob};

/// Repository for durable export job state.
#[derive(Debug, Clone)]
pub struct ExportJobRepository {
    pool: SqlitePool,
}

impl ExportJobRepository {
    /// Create a new export job repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new job under the given pre-minted identifier.
    pub async fn create(&self, id: &str, data: &NewExportJob) -> AppResult<ExportJob> {
        let now = Utc::now();
        sqlx::query_as::<_, ExportJob>(
            "INSERT INTO export_jobs \
             (id, owner_id, requester_id, total_items, chunk_size, chunks_total, chunks_done, \
              status, partial_artifacts, error_message, snapshot_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, 0, 'pending', '[]', NULL, ?, ?, ?) RETURNING *",
        )
        .bind(id)
        .bind(data.owner_id)
        .bind(data.requester_id)
        .bind(data.total_items)
        .bind(data.chunk_size)
        .bind(data.chunks_total())
        .bind(data.snapshot_at)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create export job", e))
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ExportJob>> {
        sqlx::query_as::<_, ExportJob>("SELECT * FROM export_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find export job", e)
            })
    }

    /// Reflect one finished chunk: increment `chunks_done`, replace the
    /// artifact list, and move the status forward.
    ///
    /// The update only matches while the job still sits at
    /// `expected_chunks_done` and is not terminal. Returns `false` when a
    /// concurrent processor got there first; the caller must then discard
    /// its output and stop.
    pub async fn advance_chunk(
        &self,
        job_id: &str,
        expected_chunks_done: i64,
        artifacts: &[String],
        new_status: ExportJobStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE export_jobs \
             SET chunks_done = chunks_done + 1, partial_artifacts = ?, status = ?, updated_at = ? \
             WHERE id = ? AND chunks_done = ? AND status IN ('pending', 'processing')",
        )
        .bind(Json(artifacts.to_vec()))
        .bind(new_status)
        .bind(Utc::now())
        .bind(job_id)
        .bind(expected_chunks_done)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to advance export job", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Complete a job early, without touching the chunk counter.
    ///
    /// Used when a chunk query comes back empty because the signature set
    /// shrank after the job was created. Same conflict rules as
    /// [`advance_chunk`](Self::advance_chunk).
    pub async fn mark_completed(&self, job_id: &str, expected_chunks_done: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE export_jobs SET status = 'completed', updated_at = ? \
             WHERE id = ? AND chunks_done = ? AND status IN ('pending', 'processing')",
        )
        .bind(Utc::now())
        .bind(job_id)
        .bind(expected_chunks_done)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to complete export job", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a non-terminal job as failed.
    pub async fn mark_failed(&self, job_id: &str, message: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE export_jobs SET status = 'failed', error_message = ?, updated_at = ? \
             WHERE id = ? AND status IN ('pending', 'processing')",
        )
        .bind(message)
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to fail export job", e))?;
        Ok(())
    }

    /// Delete a job row.
    pub async fn delete(&self, job_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM export_jobs WHERE id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete export job", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Find jobs not touched since `cutoff`, whatever their status.
    pub async fn find_stale(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<ExportJob>> {
        sqlx::query_as::<_, ExportJob>(
            "SELECT * FROM export_jobs WHERE updated_at <= ? ORDER BY updated_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find stale export jobs", e)
        })
    }
}
