//! Signature entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use signet_core::types::{SignatureId, UserId};

/// A stored email signature.
///
/// The rendered output is produced by substituting these fields into an
/// HTML template; the raw values here are untrusted user input.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signature {
    /// Unique signature identifier.
    pub id: SignatureId,
    /// Owning user.
    pub user_id: UserId,
    /// Person name shown in the signature.
    pub name: String,
    /// Job title or role line.
    pub role: String,
    /// Contact email address.
    pub email: String,
    /// Contact phone number (free-form).
    pub phone: String,
    /// File name of the HTML template this signature renders with.
    pub template: String,
    /// When the signature was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSignature {
    /// Owning user.
    pub user_id: UserId,
    /// Person name.
    pub name: String,
    /// Job title or role line.
    pub role: String,
    /// Contact email address.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Template file name.
    pub template: String,
}
