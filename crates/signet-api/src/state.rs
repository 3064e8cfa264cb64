//! Application state shared across all handlers.

use std::sync::Arc;

use signet_auth::SessionManager;
use signet_core::config::AppConfig;
use signet_database::DatabasePool;
use signet_database::repositories::DispatchLogRepository;
use signet_dispatch::DispatchEngine;
use signet_export::{ArchiveAssembler, ExportService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// SQLite connection pool
    pub db: DatabasePool,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer-token session resolver
    pub session_manager: Arc<SessionManager>,

    // ── Repositories ─────────────────────────────────────────
    /// Append-only dispatch audit log
    pub dispatch_log_repo: Arc<DispatchLogRepository>,

    // ── Services ─────────────────────────────────────────────
    /// Export job planning, status, and per-signature exports
    pub export_service: Arc<ExportService>,
    /// Final archive assembly and streaming
    pub assembler: Arc<ArchiveAssembler>,
    /// Sequential bulk-dispatch engine
    pub dispatch_engine: Arc<DispatchEngine>,
}
