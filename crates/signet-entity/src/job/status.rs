//! Export job status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a batch export job.
///
/// Transitions only move forward: `Pending` → `Processing` → `Completed`,
/// with `Failed` reachable from the two non-terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExportJobStatus {
    /// Created, no chunk reflected yet.
    Pending,
    /// At least one chunk reflected, more remain.
    Processing,
    /// All chunks reflected; the archive can be downloaded.
    Completed,
    /// A chunk hit an unrecoverable storage failure.
    Failed,
}

impl ExportJobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExportJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
