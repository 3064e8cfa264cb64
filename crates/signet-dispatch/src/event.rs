//! Progress events emitted during a dispatch run.
//!
//! Every processed item produces exactly one event, in submission order,
//! and every run that is not aborted closes with exactly one `finished`
//! event. The JSON shape is what the browser-side progress view consumes.

use serde::{Deserialize, Serialize};

/// Position of an event within its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based index of the item this event belongs to.
    pub current: i64,
    /// Total number of items in the run.
    pub total: i64,
}

/// One progress event, tagged by its `status` field on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// The item was handed to the relay.
    Success { message: String, progress: Progress },
    /// The item could not be dispatched; the run continues.
    Error { message: String, progress: Progress },
    /// Terminal event; the stream closes after it.
    Finished { summary: String, progress: Progress },
}

impl ProgressEvent {
    pub fn success(message: impl Into<String>, current: i64, total: i64) -> Self {
        Self::Success {
            message: message.into(),
            progress: Progress { current, total },
        }
    }

    pub fn error(message: impl Into<String>, current: i64, total: i64) -> Self {
        Self::Error {
            message: message.into(),
            progress: Progress { current, total },
        }
    }

    pub fn finished(summary: impl Into<String>, total: i64) -> Self {
        Self::Finished {
            summary: summary.into(),
            progress: Progress {
                current: total,
                total,
            },
        }
    }

    /// The event's position within the run.
    pub fn progress(&self) -> Progress {
        match self {
            Self::Success { progress, .. }
            | Self::Error { progress, .. }
            | Self::Finished { progress, .. } => *progress,
        }
    }
}
