//! Dispatch outcome enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// The item was handed to the delivery relay.
    Success,
    /// The item could not be delivered (bad address, missing template,
    /// relay rejection).
    Error,
}

impl DispatchStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
