//! Signature template store configuration.

use serde::{Deserialize, Serialize};

/// Template store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory containing signature HTML templates.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Template used when a signature references a missing template.
    #[serde(default = "default_template")]
    pub default_template: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            default_template: default_template(),
        }
    }
}

fn default_directory() -> String {
    "templates".to_string()
}

fn default_template() -> String {
    "signature_default.html".to_string()
}
