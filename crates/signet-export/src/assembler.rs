//! Archive assembler: merges partial archives into the final download.
//!
//! The final zip namespaces every signature under its chunk directory and
//! adds a human README plus a machine manifest. The returned stream owns
//! a cleanup task that fires on drop, so the spool files and the job row
//! disappear whether the client read everything or hung up halfway.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use pin_project_lite::pin_project;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use zip::{ZipArchive, ZipWriter};
use zip::write::SimpleFileOptions;

use signet_auth::RequestContext;
use signet_core::error::{AppError, ErrorKind};
use signet_core::result::AppResult;
use signet_database::repositories::{ExportJobRepository, UserRepository};
use signet_entity::job::ExportJobStatus;

use crate::artifacts::{ArtifactStore, slugify, zip_error};

/// Merges a completed job's partials into one downloadable archive.
#[derive(Debug, Clone)]
pub struct ArchiveAssembler {
    job_repo: Arc<ExportJobRepository>,
    user_repo: Arc<UserRepository>,
    artifacts: Arc<ArtifactStore>,
}

/// A ready-to-stream export archive.
pub struct ExportDownload {
    /// Client-facing attachment file name.
    pub filename: String,
    /// Archive bytes; dropping it cleans the job up.
    pub stream: ArchiveStream,
}

impl std::fmt::Debug for ExportDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDownload")
            .field("filename", &self.filename)
            .finish()
    }
}

impl ArchiveAssembler {
    /// Create a new archive assembler.
    pub fn new(
        job_repo: Arc<ExportJobRepository>,
        user_repo: Arc<UserRepository>,
        artifacts: Arc<ArtifactStore>,
    ) -> Self {
        Self {
            job_repo,
            user_repo,
            artifacts,
        }
    }

    /// Build the final archive for a completed job and open it for streaming.
    pub async fn assemble(&self, ctx: &RequestContext, job_id: &str) -> AppResult<ExportDownload> {
        let job = self
            .job_repo
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::not_found("Export job not found"))?;

        if !ctx.can_act_for(job.owner_id) && ctx.user_id != job.requester_id {
            return Err(AppError::authorization("You do not have access to this export"));
        }
        if job.status != ExportJobStatus::Completed {
            return Err(AppError::conflict(format!(
                "Export is not ready for download (status: {})",
                job.status
            )));
        }

        let owner = self
            .user_repo
            .find_by_id(job.owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Export owner no longer exists"))?;

        let final_path = self.artifacts.path_of(&ArtifactStore::final_name(&job.id));
        let partials: Vec<PathBuf> = job
            .partial_artifacts
            .0
            .iter()
            .map(|name| self.artifacts.path_of(name))
            .collect();

        let now = Utc::now();
        let user = owner.display_name().to_string();
        let entry_count = {
            let target = final_path.clone();
            let sources = partials.clone();
            let user = user.clone();
            tokio::task::spawn_blocking(move || build_final(&target, &sources, &user, now))
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Internal, "Archive task panicked", e)
                })??
        };

        info!(job_id = %job.id, entries = entry_count, "Final export archive assembled");

        let file = File::open(&final_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to open final archive", e)
        })?;

        let filename = format!(
            "signatures_{}_{}.zip",
            slugify(&user),
            now.format("%Y-%m-%d_%H-%M")
        );

        let mut paths = partials;
        paths.push(final_path);

        Ok(ExportDownload {
            filename,
            stream: ArchiveStream {
                inner: ReaderStream::new(file),
                cleanup: Some(CleanupTask {
                    job_id: job.id,
                    paths,
                    job_repo: Arc::clone(&self.job_repo),
                }),
            },
        })
    }
}

/// Copy all partial entries into the final archive, then append the
/// README and the manifest. Returns the number of signature entries.
fn build_final(
    target: &Path,
    partials: &[PathBuf],
    user: &str,
    generated_at: DateTime<Utc>,
) -> AppResult<usize> {
    let file = std::fs::File::create(target).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create final archive '{}'", target.display()),
            e,
        )
    })?;
    let mut writer = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entry_count = 0usize;
    for (chunk_index, partial) in partials.iter().enumerate() {
        let source = std::fs::File::open(partial).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Partial archive missing: '{}'", partial.display()),
                e,
            )
        })?;
        let mut archive = ZipArchive::new(source).map_err(zip_error)?;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(zip_error)?;
            if entry.is_dir() {
                continue;
            }
            let name = format!("signatures/chunk_{:03}/{}", chunk_index, entry.name());
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content).map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read partial entry", e)
            })?;
            writer.start_file(name, options).map_err(zip_error)?;
            writer.write_all(&content).map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to write archive entry", e)
            })?;
            entry_count += 1;
        }
    }

    let date = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    let readme = format!(
        "Signature export for {user}\nGenerated: {date}\nSignatures: {entry_count}\n\n\
         Every HTML file under signatures/ is one signature, ready to paste\n\
         into a mail client.\n"
    );
    writer.start_file("README.txt", options).map_err(zip_error)?;
    writer.write_all(readme.as_bytes()).map_err(|e| {
        AppError::with_source(ErrorKind::Storage, "Failed to write archive entry", e)
    })?;

    let manifest = serde_json::json!({
        "user": user,
        "count": entry_count,
        "date": date,
    });
    writer.start_file("manifest.json", options).map_err(zip_error)?;
    writer
        .write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to write archive entry", e)
        })?;

    writer.finish().map_err(zip_error)?;
    Ok(entry_count)
}

pin_project! {
    /// Streaming body over the final archive.
    ///
    /// Dropping the stream, whether it ran to the end or the client went
    /// away mid-transfer, removes every spool file of the job and the job
    /// row itself.
    pub struct ArchiveStream {
        #[pin]
        inner: ReaderStream<File>,
        cleanup: Option<CleanupTask>,
    }

    impl PinnedDrop for ArchiveStream {
        fn drop(this: Pin<&mut Self>) {
            if let Some(cleanup) = this.project().cleanup.take() {
                tokio::spawn(cleanup.run());
            }
        }
    }
}

impl Stream for ArchiveStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

/// Deferred removal of a finished job and its spool files.
struct CleanupTask {
    job_id: String,
    paths: Vec<PathBuf>,
    job_repo: Arc<ExportJobRepository>,
}

impl CleanupTask {
    async fn run(self) {
        for path in &self.paths {
            crate::artifacts::remove_quietly(path).await;
        }
        match self.job_repo.delete(&self.job_id).await {
            Ok(_) => debug!(job_id = %self.job_id, "Export job cleaned up after download"),
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "Failed to delete job after download")
            }
        }
    }
}
