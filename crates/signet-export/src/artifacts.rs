//! Artifact spool: partial archives, file naming, and the CSV sheet.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use signet_core::config::export::ExportConfig;
use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;
use signet_entity::signature::Signature;

/// Creates and removes archive files inside the export spool directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Spool directory; every artifact path resolves under here.
    root: PathBuf,
}

impl ArtifactStore {
    /// Open the spool directory, creating it if missing.
    pub async fn new(config: &ExportConfig) -> AppResult<Self> {
        fs::create_dir_all(&config.spool_dir).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create spool directory '{}'", config.spool_dir),
                e,
            )
        })?;
        Ok(Self {
            root: PathBuf::from(&config.spool_dir),
        })
    }

    /// Spool file name of the partial archive for one chunk.
    pub fn partial_name(job_id: &str, chunk_index: i64) -> String {
        format!("part_{job_id}_{chunk_index:03}.zip")
    }

    /// Spool file name of the assembled final archive.
    pub fn final_name(job_id: &str) -> String {
        format!("export_{job_id}.zip")
    }

    /// Full path of a spool file.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write one chunk's rendered signatures into a partial zip.
    ///
    /// Returns the spool-relative file name that gets recorded on the job.
    pub async fn write_partial(
        &self,
        job_id: &str,
        chunk_index: i64,
        entries: Vec<(String, String)>,
    ) -> AppResult<String> {
        let name = Self::partial_name(job_id, chunk_index);
        let path = self.path_of(&name);
        let count = entries.len();

        tokio::task::spawn_blocking(move || write_zip(&path, entries))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Archive task panicked", e))??;

        debug!(job_id, chunk = chunk_index, entries = count, "Partial archive written");
        Ok(name)
    }

    /// Remove spool files, ignoring ones that are already gone.
    pub async fn remove_files(&self, names: &[String]) {
        for name in names {
            remove_quietly(&self.path_of(name)).await;
        }
    }
}

/// Delete one file; only surprises are worth a log line.
pub(crate) async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove spool file");
        }
    }
}

/// Archive entry name for one signature, unique via the record id.
pub fn entry_name(signature: &Signature) -> String {
    format!("{}_{}.html", slugify(&signature.name), signature.id)
}

/// Reduce a display string to a lowercase file-name-safe slug.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_separator = false;
        } else {
            pending_separator = true;
        }
    }
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}

/// Byte order mark that makes spreadsheet tools detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Render signatures as a CSV sheet with a BOM and a header row.
pub fn build_csv(signatures: &[Signature]) -> AppResult<Vec<u8>> {
    let mut buf = Vec::from(UTF8_BOM);
    let mut writer = csv::Writer::from_writer(&mut buf);
    writer
        .write_record(["Name", "Role", "Email", "Phone", "Template", "Created"])
        .map_err(csv_error)?;
    for signature in signatures {
        let created = signature.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        writer
            .write_record([
                signature.name.as_str(),
                signature.role.as_str(),
                signature.email.as_str(),
                signature.phone.as_str(),
                signature.template.as_str(),
                created.as_str(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|e| {
        AppError::with_source(ErrorKind::Serialization, "Failed to finish CSV sheet", e)
    })?;
    drop(writer);
    Ok(buf)
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::with_source(ErrorKind::Serialization, "Failed to write CSV sheet", e)
}

pub(crate) fn zip_error(e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, "Archive write failed", e)
}

fn write_zip(path: &Path, entries: Vec<(String, String)>) -> AppResult<()> {
    let file = std::fs::File::create(path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create archive '{}'", path.display()),
            e,
        )
    })?;
    let mut writer = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, html) in entries {
        writer.start_file(name, options).map_err(zip_error)?;
        writer.write_all(html.as_bytes()).map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to write archive entry", e)
        })?;
    }
    writer.finish().map_err(zip_error)?;
    Ok(())
}
