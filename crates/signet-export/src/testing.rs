//! Shared fixtures for the crate's unit tests.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tokio::sync::mpsc;

use signet_core::config::export::ExportConfig;
use signet_core::config::templates::TemplatesConfig;
use signet_core::types::UserId;
use signet_database::migration::run_migrations;
use signet_database::repositories::{
    ExportJobRepository, SessionRepository, SignatureRepository, UserRepository,
};
use signet_entity::signature::{CreateSignature, Signature};
use signet_template::{SignatureRenderer, TemplateStore};

use crate::artifacts::ArtifactStore;
use crate::assembler::ArchiveAssembler;
use crate::processor::ChunkProcessor;
use crate::runner::{ChunkTask, export_queue};
use crate::service::ExportService;

pub(crate) struct TestStack {
    pub pool: SqlitePool,
    pub job_repo: Arc<ExportJobRepository>,
    pub signature_repo: Arc<SignatureRepository>,
    pub user_repo: Arc<UserRepository>,
    pub session_repo: Arc<SessionRepository>,
    pub artifacts: Arc<ArtifactStore>,
    pub processor: Arc<ChunkProcessor>,
    pub service: ExportService,
    pub assembler: ArchiveAssembler,
    pub rx: mpsc::UnboundedReceiver<ChunkTask>,
    pub spool: tempfile::TempDir,
    _templates: tempfile::TempDir,
}

/// Full in-memory stack with a default template on disk and chunk size 2.
pub(crate) async fn stack() -> TestStack {
    stack_with_default_template(true).await
}

/// Same stack but without any template file, so every render fails.
pub(crate) async fn broken_template_stack() -> TestStack {
    stack_with_default_template(false).await
}

async fn stack_with_default_template(write_default: bool) -> TestStack {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");

    let spool = tempfile::tempdir().expect("spool dir");
    let templates_dir = tempfile::tempdir().expect("template dir");
    if write_default {
        std::fs::write(
            templates_dir.path().join("signature_default.html"),
            "<p>{{NAME}} &lt;{{EMAIL}}&gt; {{PHONE_CLEAN}}</p>",
        )
        .expect("default template");
    }

    let export_config = ExportConfig {
        chunk_size: 2,
        spool_dir: spool.path().to_string_lossy().into_owned(),
        ..ExportConfig::default()
    };
    let templates_config = TemplatesConfig {
        directory: templates_dir.path().to_string_lossy().into_owned(),
        default_template: "signature_default.html".to_string(),
    };

    let artifacts = Arc::new(ArtifactStore::new(&export_config).await.expect("artifacts"));
    let templates = Arc::new(TemplateStore::new(&templates_config).await.expect("templates"));

    let job_repo = Arc::new(ExportJobRepository::new(pool.clone()));
    let signature_repo = Arc::new(SignatureRepository::new(pool.clone()));
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let session_repo = Arc::new(SessionRepository::new(pool.clone()));

    let (queue, rx) = export_queue();
    let processor = Arc::new(ChunkProcessor::new(
        Arc::clone(&job_repo),
        Arc::clone(&signature_repo),
        Arc::clone(&templates),
        SignatureRenderer::new(),
        Arc::clone(&artifacts),
        queue,
    ));
    let service = ExportService::new(
        Arc::clone(&job_repo),
        Arc::clone(&signature_repo),
        Arc::clone(&user_repo),
        Arc::clone(&templates),
        SignatureRenderer::new(),
        Arc::clone(&processor),
        &export_config,
    );
    let assembler = ArchiveAssembler::new(
        Arc::clone(&job_repo),
        Arc::clone(&user_repo),
        Arc::clone(&artifacts),
    );

    TestStack {
        pool,
        job_repo,
        signature_repo,
        user_repo,
        session_repo,
        artifacts,
        processor,
        service,
        assembler,
        rx,
        spool,
        _templates: templates_dir,
    }
}

pub(crate) async fn seed_user(pool: &SqlitePool, role: &str) -> UserId {
    let id = UserId::new();
    sqlx::query(
        "INSERT INTO users (id, username, full_name, role, is_active, created_at) \
         VALUES (?, ?, ?, ?, 1, ?)",
    )
    .bind(id)
    .bind(format!("user-{id}"))
    .bind("Jane Smith")
    .bind(role)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("seed user");
    id
}

pub(crate) async fn seed_signatures(
    repo: &SignatureRepository,
    user_id: UserId,
    count: usize,
) -> Vec<Signature> {
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        let signature = repo
            .create(&CreateSignature {
                user_id,
                name: format!("Person {i}"),
                role: "Engineer".to_string(),
                email: format!("person{i}@example.test"),
                phone: format!("+49 151 000{i}"),
                template: "signature_default.html".to_string(),
            })
            .await
            .expect("seed signature");
        created.push(signature);
    }
    created
}
