//! Signet server: batch signature export and bulk dispatch.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use signet_api::{AppState, build_router};
use signet_auth::SessionManager;
use signet_core::config::AppConfig;
use signet_core::error::AppError;
use signet_database::DatabasePool;
use signet_database::migration::run_migrations;
use signet_database::repositories::{
    DispatchLogRepository, ExportJobRepository, SessionRepository, SignatureRepository,
    UserRepository,
};
use signet_dispatch::{Courier, DispatchEngine, HttpCourier};
use signet_export::{
    ArchiveAssembler, ArtifactStore, ChunkProcessor, ExportService, ExportWorker, RetentionSweeper,
    export_queue,
};
use signet_template::{SignatureRenderer, TemplateStore};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SIGNET_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Signet v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Create data directories ──────────────────────────
    create_data_directories(&config).await?;

    // ── Step 2: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 3: Initialize repositories ──────────────────────────
    let pool = db.pool().clone();
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let session_repo = Arc::new(SessionRepository::new(pool.clone()));
    let signature_repo = Arc::new(SignatureRepository::new(pool.clone()));
    let job_repo = Arc::new(ExportJobRepository::new(pool.clone()));
    let dispatch_log_repo = Arc::new(DispatchLogRepository::new(pool.clone()));

    // ── Step 4: Initialize auth ──────────────────────────────────
    let session_manager = Arc::new(SessionManager::new(
        Arc::clone(&session_repo),
        Arc::clone(&user_repo),
    ));

    // ── Step 5: Initialize template store ────────────────────────
    let templates = Arc::new(TemplateStore::new(&config.templates).await?);
    let renderer = SignatureRenderer::new();

    // ── Step 6: Initialize export pipeline ───────────────────────
    let artifacts = Arc::new(ArtifactStore::new(&config.export).await?);
    let (queue, task_rx) = export_queue();
    let processor = Arc::new(ChunkProcessor::new(
        Arc::clone(&job_repo),
        Arc::clone(&signature_repo),
        Arc::clone(&templates),
        renderer,
        Arc::clone(&artifacts),
        queue,
    ));
    let export_service = Arc::new(ExportService::new(
        Arc::clone(&job_repo),
        Arc::clone(&signature_repo),
        Arc::clone(&user_repo),
        Arc::clone(&templates),
        renderer,
        Arc::clone(&processor),
        &config.export,
    ));
    let assembler = Arc::new(ArchiveAssembler::new(
        Arc::clone(&job_repo),
        Arc::clone(&user_repo),
        Arc::clone(&artifacts),
    ));

    // ── Step 7: Initialize dispatch engine ───────────────────────
    let courier: Arc<dyn Courier> = Arc::new(HttpCourier::new(&config.dispatch)?);
    let dispatch_engine = Arc::new(DispatchEngine::new(
        Arc::clone(&signature_repo),
        Arc::clone(&dispatch_log_repo),
        Arc::clone(&templates),
        renderer,
        courier,
        config.dispatch.clone(),
    ));

    // ── Step 8: Shutdown channel & background tasks ──────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = ExportWorker::new(Arc::clone(&processor), task_rx);
    let worker_cancel = shutdown_rx.clone();
    let worker_handle = tokio::spawn(async move {
        worker.run(worker_cancel).await;
    });

    let sweeper = RetentionSweeper::start(
        &config.export,
        Arc::clone(&job_repo),
        Arc::clone(&session_repo),
        Arc::clone(&artifacts),
    )
    .await?;

    // ── Step 9: Build and start HTTP server ──────────────────────
    let state = AppState {
        config: Arc::new(config.clone()),
        db: db.clone(),
        session_manager,
        dispatch_log_repo,
        export_service,
        assembler,
        dispatch_engine,
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Signet server listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 10: Wait for background tasks ───────────────────────
    tracing::info!("Waiting for background tasks to complete...");
    sweeper.shutdown().await?;
    let _ = tokio::time::timeout(Duration::from_secs(30), worker_handle).await;
    db.close().await;

    tracing::info!("Signet server shut down gracefully");
    Ok(())
}

/// Create required data directories
async fn create_data_directories(config: &AppConfig) -> Result<(), AppError> {
    let mut dirs = vec![
        config.export.spool_dir.clone(),
        config.templates.directory.clone(),
    ];

    // The SQLite driver creates the file, not its parent directory.
    if let Some(parent) = config
        .database
        .url
        .strip_prefix("sqlite:")
        .map(std::path::Path::new)
        .and_then(|p| p.parent())
    {
        if !parent.as_os_str().is_empty() {
            dirs.push(parent.to_string_lossy().into_owned());
        }
    }

    for dir in &dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create dir '{}': {}", dir, e)))?;
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
