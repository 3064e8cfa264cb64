//! Signature repository implementation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;
use signet_core::types::{SignatureId, UserId};
use signet_entity::signature::{CreateSignature, Signature};

/// Repository for stored signatures.
#[derive(Debug, Clone)]
pub struct SignatureRepository {
    pool: SqlitePool,
}

impl SignatureRepository {
    /// Create a new signature repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a signature by ID.
    pub async fn find_by_id(&self, id: SignatureId) -> AppResult<Option<Signature>> {
        sqlx::query_as::<_, Signature>("SELECT * FROM signatures WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find signature", e))
    }

    /// Count all signatures belonging to a user.
    pub async fn count_for_user(&self, user_id: UserId) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM signatures WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count signatures", e)
            })
    }

    /// Fetch one export chunk of a user's signatures.
    ///
    /// Rows are pinned to the job's creation snapshot and ordered by
    /// `(created_at DESC, id DESC)`, so every chunk query over the life of
    /// a job sees the same sequence regardless of concurrent inserts.
    pub async fn page_for_export(
        &self,
        user_id: UserId,
        snapshot_at: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Signature>> {
        sqlx::query_as::<_, Signature>(
            "SELECT * FROM signatures \
             WHERE user_id = ? AND created_at <= ? \
             ORDER BY created_at DESC, id DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(snapshot_at)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch signature chunk", e)
        })
    }

    /// List all signatures belonging to a user, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Signature>> {
        sqlx::query_as::<_, Signature>(
            "SELECT * FROM signatures WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list signatures", e))
    }

    /// Create a new signature.
    pub async fn create(&self, data: &CreateSignature) -> AppResult<Signature> {
        let now = Utc::now();
        sqlx::query_as::<_, Signature>(
            "INSERT INTO signatures (id, user_id, name, role, email, phone, template, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(SignatureId::new())
        .bind(data.user_id)
        .bind(&data.name)
        .bind(&data.role)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.template)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create signature", e))
    }
}
