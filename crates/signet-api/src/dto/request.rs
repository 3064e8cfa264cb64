//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use signet_core::types::{SignatureId, UserId};
use signet_entity::DispatchStatus;

/// Body for `POST /api/exports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExportRequest {
    /// User whose signatures to export.
    pub owner_id: UserId,
}

/// Body for `POST /api/dispatch`.
///
/// The upper bound on `item_ids` comes from configuration and is checked
/// in the handler.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchRequest {
    /// Signatures to send, processed in submission order.
    #[validate(length(min = 1, message = "item_ids must not be empty"))]
    pub item_ids: Vec<SignatureId>,
}

/// Query scope for per-user endpoints (`?user_id=`).
#[derive(Debug, Clone, Deserialize)]
pub struct UserScopeQuery {
    /// Owner of the signatures in question.
    pub user_id: UserId,
}

/// Optional outcome filter for the dispatch log (`?status=`).
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchLogFilter {
    /// Restrict to one outcome; absent means all entries.
    pub status: Option<DispatchStatus>,
}
