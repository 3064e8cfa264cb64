//! Export orchestration facade used by the HTTP layer.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use signet_auth::{RequestContext, token};
use signet_core::config::export::ExportConfig;
use signet_core::error::AppError;
use signet_core::result::AppResult;
use signet_core::types::{SignatureId, UserId};
use signet_database::repositories::{ExportJobRepository, SignatureRepository, UserRepository};
use signet_entity::job::{ExportJob, NewExportJob};
use signet_template::{SignatureRenderer, TemplateStore};

use crate::artifacts::{build_csv, slugify};
use crate::processor::ChunkProcessor;

/// A single signature rendered for download.
#[derive(Debug)]
pub struct RenderedSignature {
    /// Client-facing attachment file name.
    pub filename: String,
    /// Rendered HTML document.
    pub html: String,
}

/// CSV export payload.
#[derive(Debug)]
pub struct CsvExport {
    /// Client-facing attachment file name.
    pub filename: String,
    /// CSV bytes, BOM included.
    pub bytes: Vec<u8>,
}

/// Front door for export jobs and per-signature exports.
#[derive(Debug, Clone)]
pub struct ExportService {
    job_repo: Arc<ExportJobRepository>,
    signature_repo: Arc<SignatureRepository>,
    user_repo: Arc<UserRepository>,
    templates: Arc<TemplateStore>,
    renderer: SignatureRenderer,
    processor: Arc<ChunkProcessor>,
    chunk_size: i64,
}

impl ExportService {
    /// Create a new export service.
    pub fn new(
        job_repo: Arc<ExportJobRepository>,
        signature_repo: Arc<SignatureRepository>,
        user_repo: Arc<UserRepository>,
        templates: Arc<TemplateStore>,
        renderer: SignatureRenderer,
        processor: Arc<ChunkProcessor>,
        config: &ExportConfig,
    ) -> Self {
        Self {
            job_repo,
            signature_repo,
            user_repo,
            templates,
            renderer,
            processor,
            chunk_size: config.chunk_size,
        }
    }

    /// Create an export job for `owner_id` and run its first chunk.
    ///
    /// Regular users may only export their own signatures; admins may
    /// export on behalf of anyone. The first chunk runs on the request so
    /// the response already reflects real progress; the worker picks the
    /// job up from there.
    pub async fn initiate(&self, ctx: &RequestContext, owner_id: UserId) -> AppResult<ExportJob> {
        if !ctx.can_act_for(owner_id) {
            return Err(AppError::authorization(
                "You may only export your own signatures",
            ));
        }

        let total = self.signature_repo.count_for_user(owner_id).await?;
        if total == 0 {
            return Err(AppError::validation("There are no signatures to export"));
        }

        let job_id = token::mint();
        let job = self
            .job_repo
            .create(
                &job_id,
                &NewExportJob {
                    owner_id,
                    requester_id: ctx.user_id,
                    total_items: total,
                    chunk_size: self.chunk_size,
                    snapshot_at: Utc::now(),
                },
            )
            .await?;

        info!(
            job_id = %job.id,
            owner_id = %owner_id,
            total_items = total,
            chunks = job.chunks_total,
            "Export job created"
        );

        self.processor.process_chunk(&job.id, 0).await?;

        self.job_repo
            .find_by_id(&job.id)
            .await?
            .ok_or_else(|| AppError::internal("Export job vanished during first chunk"))
    }

    /// Look up a job on behalf of a caller.
    ///
    /// Visible to the job's requester, the data owner, and admins.
    pub async fn status(&self, ctx: &RequestContext, job_id: &str) -> AppResult<ExportJob> {
        let job = self
            .job_repo
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::not_found("Export job not found"))?;

        if !ctx.can_act_for(job.owner_id) && ctx.user_id != job.requester_id {
            return Err(AppError::authorization(
                "You do not have access to this export",
            ));
        }
        Ok(job)
    }

    /// Count a user's signatures, with the same ownership rule as exports.
    pub async fn signature_count(&self, ctx: &RequestContext, user_id: UserId) -> AppResult<i64> {
        if !ctx.can_act_for(user_id) {
            return Err(AppError::authorization(
                "You may only view your own signature count",
            ));
        }
        self.signature_repo.count_for_user(user_id).await
    }

    /// Render one signature into a standalone HTML document.
    pub async fn render_single(
        &self,
        ctx: &RequestContext,
        signature_id: SignatureId,
    ) -> AppResult<RenderedSignature> {
        let signature = self
            .signature_repo
            .find_by_id(signature_id)
            .await?
            .ok_or_else(|| AppError::not_found("Signature not found"))?;

        if !ctx.can_act_for(signature.user_id) {
            return Err(AppError::authorization(
                "You do not have access to this signature",
            ));
        }

        let template = self.templates.load(&signature.template).await?;
        let html = self.renderer.render(&template, &signature);

        Ok(RenderedSignature {
            filename: format!("signature_{}.html", slugify(&signature.name)),
            html,
        })
    }

    /// Export all of a user's signatures as one CSV sheet.
    pub async fn export_csv(&self, ctx: &RequestContext, user_id: UserId) -> AppResult<CsvExport> {
        if !ctx.can_act_for(user_id) {
            return Err(AppError::authorization(
                "You may only export your own signatures",
            ));
        }

        let owner = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let signatures = self.signature_repo.list_for_user(user_id).await?;
        let bytes = build_csv(&signatures)?;

        Ok(CsvExport {
            filename: format!(
                "signatures_{}_{}.csv",
                slugify(owner.display_name()),
                Utc::now().format("%Y-%m-%d")
            ),
            bytes,
        })
    }
}
