//! User repository implementation.

use sqlx::SqlitePool;

use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;
use signet_core::types::UserId;
use signet_entity::user::User;

/// Repository for user lookups.
///
/// User provisioning happens outside this service, so this repository is
/// read-only.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user", e))
    }
}
