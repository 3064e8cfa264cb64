//! Export job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use signet_core::types::UserId;

use super::status::ExportJobStatus;

/// A batch export job.
///
/// The `id` is the only externally visible handle: 32 lowercase hex chars
/// from 16 cryptographically random bytes, so it is unguessable and doubles
/// as the capability to poll the job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExportJob {
    /// Opaque random job identifier.
    pub id: String,
    /// User whose signatures are being exported.
    pub owner_id: UserId,
    /// User who initiated the export (admin exports may differ from owner).
    pub requester_id: UserId,
    /// Number of signatures counted at creation time.
    pub total_items: i64,
    /// Signatures fetched and rendered per chunk.
    pub chunk_size: i64,
    /// Total number of chunks planned at creation.
    pub chunks_total: i64,
    /// Number of chunks whose output has been durably reflected.
    pub chunks_done: i64,
    /// Current job status.
    pub status: ExportJobStatus,
    /// Spool-relative paths of per-chunk partial archives, in chunk order.
    pub partial_artifacts: Json<Vec<String>>,
    /// Error message when the job failed.
    pub error_message: Option<String>,
    /// Ordering pin: chunk queries only see signatures created at or
    /// before this instant, so pagination stays stable under inserts.
    pub snapshot_at: DateTime<Utc>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ExportJob {
    /// The chunk index the processor should work on next.
    pub fn next_chunk_index(&self) -> i64 {
        self.chunks_done
    }

    /// Check whether every planned chunk has been reflected.
    pub fn all_chunks_done(&self) -> bool {
        self.chunks_done >= self.chunks_total
    }
}

/// Data required to create a new export job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExportJob {
    /// User whose signatures are being exported.
    pub owner_id: UserId,
    /// User who initiated the export.
    pub requester_id: UserId,
    /// Number of signatures counted at creation time.
    pub total_items: i64,
    /// Signatures per chunk.
    pub chunk_size: i64,
    /// Ordering pin for chunk queries.
    pub snapshot_at: DateTime<Utc>,
}

impl NewExportJob {
    /// Number of chunks needed to cover `total_items`.
    pub fn chunks_total(&self) -> i64 {
        if self.chunk_size <= 0 {
            return 0;
        }
        (self.total_items + self.chunk_size - 1) / self.chunk_size
    }
}
