//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use signet_core::types::UserId;

/// An authenticated session.
///
/// Sessions are opaque bearer tokens minted outside this service's scope
/// and presented in the `Authorization` header. Signet only looks them up
/// and checks expiry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// The bearer token (primary key, 32 hex chars).
    pub token: String,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}
