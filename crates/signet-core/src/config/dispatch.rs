//! Bulk dispatch configuration.

use serde::{Deserialize, Serialize};

/// Bulk dispatch engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// URL of the outbound delivery relay.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Per-request timeout against the relay, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Pause after every dispatched item, in milliseconds.
    #[serde(default = "default_per_item_delay")]
    pub per_item_delay_ms: u64,
    /// Number of consecutive successes before the longer pause kicks in.
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
    /// Longer pause after each burst, in seconds.
    #[serde(default = "default_burst_pause")]
    pub burst_pause_secs: u64,
    /// Maximum number of items accepted in a single dispatch request.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            timeout_seconds: default_timeout(),
            per_item_delay_ms: default_per_item_delay(),
            burst_size: default_burst_size(),
            burst_pause_secs: default_burst_pause(),
            max_items: default_max_items(),
        }
    }
}

fn default_relay_url() -> String {
    "http://127.0.0.1:8025/api/send".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_per_item_delay() -> u64 {
    500
}

fn default_burst_size() -> u32 {
    10
}

fn default_burst_pause() -> u64 {
    2
}

fn default_max_items() -> usize {
    500
}
