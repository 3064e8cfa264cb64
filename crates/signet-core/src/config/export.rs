//! Batch export configuration.

use serde::{Deserialize, Serialize};

/// Batch export engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of signatures fetched and rendered per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
    /// Directory holding partial and final export archives.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
    /// Age in minutes after which unfinished or undownloaded jobs are reaped.
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: i64,
    /// Cron schedule for the retention sweep (seconds-resolution, 6 fields).
    #[serde(default = "default_sweep_schedule")]
    pub sweep_schedule: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            spool_dir: default_spool_dir(),
            retention_minutes: default_retention_minutes(),
            sweep_schedule: default_sweep_schedule(),
        }
    }
}

fn default_chunk_size() -> i64 {
    50
}

fn default_spool_dir() -> String {
    "data/spool".to_string()
}

fn default_retention_minutes() -> i64 {
    60
}

fn default_sweep_schedule() -> String {
    "0 */10 * * * *".to_string()
}
