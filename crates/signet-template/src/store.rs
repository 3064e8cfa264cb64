//! Sandboxed template file store.
//!
//! Template names arrive from the database and, transitively, from user
//! input. A name is only ever resolved to a file inside the configured
//! template directory: path components are stripped, the name must pass a
//! conservative allow-list, and the canonicalized result must still sit
//! under the canonicalized root. Anything that fails resolves to the
//! default template (or an error in strict mode).

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use signet_core::config::templates::TemplatesConfig;
use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;

/// Sandboxed access to signature HTML templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    /// Canonicalized template root; the containment boundary.
    root: PathBuf,
    /// File name of the fallback template.
    default_template: String,
}

impl TemplateStore {
    /// Create a store rooted at the configured directory.
    ///
    /// The directory is created if missing so the root can be
    /// canonicalized up front.
    pub async fn new(config: &TemplatesConfig) -> AppResult<Self> {
        fs::create_dir_all(&config.directory).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create template directory '{}'", config.directory),
                e,
            )
        })?;

        let root = fs::canonicalize(&config.directory).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve template directory '{}'", config.directory),
                e,
            )
        })?;

        Ok(Self {
            root,
            default_template: config.default_template.clone(),
        })
    }

    /// Load a template by name, falling back to the default template when
    /// the name is invalid or the file is missing.
    pub async fn load(&self, name: &str) -> AppResult<String> {
        if let Some(content) = self.read_checked(name).await? {
            return Ok(content);
        }

        warn!(template = name, "Template unavailable, using default");
        self.read_checked(&self.default_template)
            .await?
            .ok_or_else(|| {
                AppError::new(
                    ErrorKind::Storage,
                    format!("Default template '{}' is missing", self.default_template),
                )
            })
    }

    /// Load a template by name with no fallback.
    pub async fn load_strict(&self, name: &str) -> AppResult<String> {
        self.read_checked(name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Template '{name}' not found")))
    }

    /// Resolve and read one template, returning `None` for anything that
    /// does not resolve to a regular file inside the root.
    async fn read_checked(&self, name: &str) -> AppResult<Option<String>> {
        let Some(file_name) = sanitize_name(name) else {
            warn!(template = name, "Rejected template name");
            return Ok(None);
        };

        let candidate = self.root.join(file_name);
        let resolved = match fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to resolve template '{file_name}'"),
                    e,
                ));
            }
        };

        // Symlinks pointing out of the sandbox fail here, not at read time.
        if !resolved.starts_with(&self.root) {
            warn!(template = name, "Template resolved outside sandbox");
            return Ok(None);
        }

        match fs::read_to_string(&resolved).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read template '{file_name}'"),
                e,
            )),
        }
    }
}

/// Reduce a template reference to a safe bare file name.
///
/// Any directory components are dropped, then the remaining name must be
/// ASCII alphanumerics plus `.`, `_`, `-`, must not be hidden, and must
/// carry the `.html` extension.
fn sanitize_name(name: &str) -> Option<&str> {
    let file_name = Path::new(name).file_name()?.to_str()?;

    if file_name.starts_with('.') || !file_name.ends_with(".html") {
        return None;
    }
    if !file_name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-')
    {
        return None;
    }

    Some(file_name)
}
