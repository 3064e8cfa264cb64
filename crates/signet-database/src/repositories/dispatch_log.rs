//! Dispatch log repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;

use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;
use signet_core::types::DispatchLogId;
use signet_core::types::pagination::{PageRequest, PageResponse};
use signet_entity::dispatch::{CreateDispatchLogEntry, DispatchLogEntry, DispatchStatus};

/// Repository for the append-only dispatch log.
#[derive(Debug, Clone)]
pub struct DispatchLogRepository {
    pool: SqlitePool,
}

impl DispatchLogRepository {
    /// Create a new dispatch log repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record one dispatch attempt.
    pub async fn record(&self, data: &CreateDispatchLogEntry) -> AppResult<DispatchLogEntry> {
        sqlx::query_as::<_, DispatchLogEntry>(
            "INSERT INTO dispatch_log (id, signature_id, recipient, status, message, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(DispatchLogId::new())
        .bind(data.signature_id)
        .bind(&data.recipient)
        .bind(data.status)
        .bind(&data.message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to record dispatch attempt", e)
        })
    }

    /// List dispatch log entries newest first, optionally filtered by outcome.
    pub async fn find_all(
        &self,
        page: &PageRequest,
        status: Option<DispatchStatus>,
    ) -> AppResult<PageResponse<DispatchLogEntry>> {
        let (total, entries) = match status {
            Some(status) => {
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM dispatch_log WHERE status = ?")
                        .bind(status)
                        .fetch_one(&self.pool)
                        .await
                        .map_err(|e| {
                            AppError::with_source(
                                ErrorKind::Database,
                                "Failed to count dispatch log",
                                e,
                            )
                        })?;

                let entries = sqlx::query_as::<_, DispatchLogEntry>(
                    "SELECT * FROM dispatch_log WHERE status = ? \
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(status)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list dispatch log", e)
                })?;

                (total, entries)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dispatch_log")
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| {
                        AppError::with_source(ErrorKind::Database, "Failed to count dispatch log", e)
                    })?;

                let entries = sqlx::query_as::<_, DispatchLogEntry>(
                    "SELECT * FROM dispatch_log ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                )
                .bind(page.limit() as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list dispatch log", e)
                })?;

                (total, entries)
            }
        };

        Ok(PageResponse::new(
            entries,
            page.page,
            page.page_size,
            total as u64,
        ))
    }
}
