//! Session resolution.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use signet_core::error::AppError;
use signet_core::result::AppResult;
use signet_database::repositories::{SessionRepository, UserRepository};

use crate::context::RequestContext;
use crate::token;

/// How long a resolved context may be served from cache. Kept short so
/// that session deletion takes effect quickly.
const CONTEXT_TTL: Duration = Duration::from_secs(30);

/// Resolves bearer tokens into authenticated request contexts.
#[derive(Clone)]
pub struct SessionManager {
    session_repo: Arc<SessionRepository>,
    user_repo: Arc<UserRepository>,
    cache: Cache<String, RequestContext>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_repo", &self.session_repo)
            .field("user_repo", &self.user_repo)
            .finish()
    }
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(session_repo: Arc<SessionRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            session_repo,
            user_repo,
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(CONTEXT_TTL)
                .build(),
        }
    }

    /// Resolve a bearer token into a request context.
    ///
    /// Fails with an authentication error for unknown, expired, or
    /// malformed tokens and for deactivated accounts.
    pub async fn authenticate(&self, token: &str) -> AppResult<RequestContext> {
        if !token::is_valid_format(token) {
            return Err(AppError::authentication("Invalid session token"));
        }

        if let Some(context) = self.cache.get(token).await {
            return Ok(context);
        }

        let session = self
            .session_repo
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::authentication("Invalid session token"))?;

        if session.is_expired() {
            debug!(user_id = %session.user_id, "Rejected expired session");
            return Err(AppError::authentication("Session expired"));
        }

        let user = self
            .user_repo
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::authentication("Session user no longer exists"))?;

        if !user.is_active {
            return Err(AppError::authentication("Account is disabled"));
        }

        let context = RequestContext::new(user.id, user.username.clone(), user.role);
        self.cache.insert(token.to_string(), context.clone()).await;
        Ok(context)
    }
}
