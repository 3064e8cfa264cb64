//! Dispatch log entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use signet_core::types::{DispatchLogId, SignatureId};

use super::status::DispatchStatus;

/// One attempted dispatch, recorded immediately after the attempt.
///
/// The log is append-only. A row exists for every addressable item a run
/// touched, whether or not the run later aborted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DispatchLogEntry {
    /// Unique entry identifier.
    pub id: DispatchLogId,
    /// The signature that was dispatched, if it still exists.
    pub signature_id: Option<SignatureId>,
    /// Recipient address the attempt targeted.
    pub recipient: String,
    /// Outcome of the attempt.
    pub status: DispatchStatus,
    /// Human-readable detail (relay response, validation failure).
    pub message: String,
    /// When the attempt was recorded.
    pub created_at: DateTime<Utc>,
}

/// Data required to record a dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDispatchLogEntry {
    /// The signature that was dispatched.
    pub signature_id: Option<SignatureId>,
    /// Recipient address.
    pub recipient: String,
    /// Outcome.
    pub status: DispatchStatus,
    /// Detail message.
    pub message: String,
}
