//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use signet_core::types::UserId;
use signet_entity::{ExportJob, ExportJobStatus};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Export job snapshot for status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJobResponse {
    /// Opaque job identifier.
    pub job_id: String,
    /// User whose signatures are being exported.
    pub owner_id: UserId,
    /// Current status.
    pub status: ExportJobStatus,
    /// Number of signatures in the export.
    pub total_items: i64,
    /// Signatures per chunk.
    pub chunk_size: i64,
    /// Planned chunk count.
    pub chunks_total: i64,
    /// Chunks durably reflected so far.
    pub chunks_done: i64,
    /// Failure detail, present only for failed jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job last advanced.
    pub updated_at: DateTime<Utc>,
}

impl From<ExportJob> for ExportJobResponse {
    fn from(job: ExportJob) -> Self {
        Self {
            job_id: job.id,
            owner_id: job.owner_id,
            status: job.status,
            total_items: job.total_items,
            chunk_size: job.chunk_size,
            chunks_total: job.chunks_total,
            chunks_done: job.chunks_done,
            error_message: job.error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
}
