//! Shared test helpers for integration tests.
//!
//! [`TestApp`] wires the complete application the way `main.rs` does, but
//! against throwaway infrastructure: a file-backed SQLite database,
//! template and spool directories inside one temp dir, a spawned export
//! worker, and a local HTTP relay standing in for the mail gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::routing::post;
use chrono::{Duration as ChronoDuration, Utc};
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::sync::watch;
use tower::ServiceExt;

use signet_api::{AppState, build_router};
use signet_auth::{SessionManager, token};
use signet_core::config::dispatch::DispatchConfig;
use signet_core::config::export::ExportConfig;
use signet_core::config::logging::LoggingConfig;
use signet_core::config::server::ServerConfig;
use signet_core::config::templates::TemplatesConfig;
use signet_core::config::{AppConfig, DatabaseConfig};
use signet_core::types::UserId;
use signet_database::DatabasePool;
use signet_database::migration::run_migrations;
use signet_database::repositories::{
    DispatchLogRepository, ExportJobRepository, SessionRepository, SignatureRepository,
    UserRepository,
};
use signet_dispatch::{Courier, DispatchEngine, HttpCourier};
use signet_entity::signature::{CreateSignature, Signature};
use signet_export::{
    ArchiveAssembler, ArtifactStore, ChunkProcessor, ExportService, ExportWorker, export_queue,
};
use signet_template::{SignatureRenderer, TemplateStore};

/// Default template written into every test app's template directory.
const DEFAULT_TEMPLATE: &str = "<div class=\"sig\"><strong>{{NAME}}</strong> | {{ROLE}}<br>\n\
     <a href=\"mailto:{{EMAIL}}\">{{EMAIL}}</a> | \
     <a href=\"tel:{{PHONE_CLEAN}}\">{{PHONE}}</a></div>\n";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Database pool for direct queries
    pub db_pool: SqlitePool,
    /// Application config
    pub config: AppConfig,
    /// Number of deliveries the local relay has accepted
    pub relay_hits: Arc<AtomicUsize>,
    /// Keeps the export worker alive for the lifetime of the test
    _worker_shutdown: watch::Sender<bool>,
    /// Holds the database, template, and spool directories
    _data_dir: tempfile::TempDir,
}

impl TestApp {
    /// Create a new test application
    pub async fn new() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create test data dir");
        let templates_dir = data_dir.path().join("templates");
        let spool_dir = data_dir.path().join("spool");
        std::fs::create_dir_all(&templates_dir).expect("Failed to create template dir");
        std::fs::create_dir_all(&spool_dir).expect("Failed to create spool dir");
        std::fs::write(templates_dir.join("signature_default.html"), DEFAULT_TEMPLATE)
            .expect("Failed to write default template");

        let (relay_url, relay_hits) = spawn_relay().await;

        // Zero pacing so dispatch runs finish in milliseconds.
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: format!("sqlite:{}", data_dir.path().join("signet.db").display()),
                max_connections: 5,
                min_connections: 1,
                connect_timeout_seconds: 5,
            },
            templates: TemplatesConfig {
                directory: templates_dir.to_string_lossy().into_owned(),
                default_template: "signature_default.html".to_string(),
            },
            export: ExportConfig {
                chunk_size: 2,
                spool_dir: spool_dir.to_string_lossy().into_owned(),
                ..ExportConfig::default()
            },
            dispatch: DispatchConfig {
                relay_url,
                timeout_seconds: 5,
                per_item_delay_ms: 0,
                burst_size: 0,
                burst_pause_secs: 0,
                ..DispatchConfig::default()
            },
            logging: LoggingConfig::default(),
        };

        let db = DatabasePool::connect(&config.database)
            .await
            .expect("Failed to open test database");
        run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let user_repo = Arc::new(UserRepository::new(db.pool().clone()));
        let session_repo = Arc::new(SessionRepository::new(db.pool().clone()));
        let signature_repo = Arc::new(SignatureRepository::new(db.pool().clone()));
        let job_repo = Arc::new(ExportJobRepository::new(db.pool().clone()));
        let dispatch_log_repo = Arc::new(DispatchLogRepository::new(db.pool().clone()));

        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&session_repo),
            Arc::clone(&user_repo),
        ));

        let templates = Arc::new(
            TemplateStore::new(&config.templates)
                .await
                .expect("Failed to open template store"),
        );
        let artifacts = Arc::new(
            ArtifactStore::new(&config.export)
                .await
                .expect("Failed to open artifact store"),
        );

        let (queue, task_rx) = export_queue();
        let processor = Arc::new(ChunkProcessor::new(
            Arc::clone(&job_repo),
            Arc::clone(&signature_repo),
            Arc::clone(&templates),
            SignatureRenderer::new(),
            Arc::clone(&artifacts),
            queue,
        ));
        let export_service = Arc::new(ExportService::new(
            Arc::clone(&job_repo),
            Arc::clone(&signature_repo),
            Arc::clone(&user_repo),
            Arc::clone(&templates),
            SignatureRenderer::new(),
            Arc::clone(&processor),
            &config.export,
        ));
        let assembler = Arc::new(ArchiveAssembler::new(
            Arc::clone(&job_repo),
            Arc::clone(&user_repo),
            Arc::clone(&artifacts),
        ));

        let courier: Arc<dyn Courier> = Arc::new(
            HttpCourier::new(&config.dispatch).expect("Failed to build relay courier"),
        );
        let dispatch_engine = Arc::new(DispatchEngine::new(
            Arc::clone(&signature_repo),
            Arc::clone(&dispatch_log_repo),
            Arc::clone(&templates),
            SignatureRenderer::new(),
            courier,
            config.dispatch.clone(),
        ));

        let (worker_shutdown, worker_cancel) = watch::channel(false);
        tokio::spawn(ExportWorker::new(Arc::clone(&processor), task_rx).run(worker_cancel));

        let app_state = AppState {
            config: Arc::new(config.clone()),
            db: db.clone(),
            session_manager,
            dispatch_log_repo,
            export_service,
            assembler,
            dispatch_engine,
        };

        let router = build_router(app_state);

        Self {
            router,
            db_pool: db.pool().clone(),
            config,
            relay_hits,
            _worker_shutdown: worker_shutdown,
            _data_dir: data_dir,
        }
    }

    /// Create a test user and return their ID
    pub async fn create_test_user(&self, username: &str, role: &str) -> UserId {
        let id = UserId::new();

        sqlx::query(
            "INSERT INTO users (id, username, role, is_active, created_at) VALUES (?, ?, ?, 1, ?)",
        )
        .bind(id)
        .bind(username)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .expect("Failed to create test user");

        id
    }

    /// Provision a session for a user and return its bearer token
    pub async fn create_session(&self, user_id: UserId) -> String {
        self.insert_session(user_id, ChronoDuration::minutes(60))
            .await
    }

    /// Provision an already-expired session
    pub async fn create_expired_session(&self, user_id: UserId) -> String {
        self.insert_session(user_id, ChronoDuration::minutes(-5))
            .await
    }

    async fn insert_session(&self, user_id: UserId, ttl: ChronoDuration) -> String {
        let token = token::mint();

        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now())
        .bind(Utc::now() + ttl)
        .execute(&self.db_pool)
        .await
        .expect("Failed to create test session");

        token
    }

    /// Seed one signature for a user
    pub async fn seed_signature(&self, user_id: UserId, name: &str, email: &str) -> Signature {
        SignatureRepository::new(self.db_pool.clone())
            .create(&CreateSignature {
                user_id,
                name: name.to_string(),
                role: "Engineer".to_string(),
                email: email.to_string(),
                phone: "+1 (555) 010-4477".to_string(),
                template: "signature_default.html".to_string(),
            })
            .await
            .expect("Failed to seed signature")
    }

    /// Poll an export job's status endpoint until it reports completion
    pub async fn wait_until_completed(&self, token: &str, job_id: &str) -> Value {
        for _ in 0..200 {
            let response = self
                .request("GET", &format!("/api/exports/{job_id}"), None, Some(token))
                .await;
            assert_eq!(
                response.status,
                StatusCode::OK,
                "Status poll failed: {:?}",
                response.body
            );
            match response.body["data"]["status"].as_str() {
                Some("completed") => return response.body,
                Some("failed") => panic!("Export job failed: {:?}", response.body),
                _ => tokio::time::sleep(Duration::from_millis(25)).await,
            }
        }
        panic!("Export job {job_id} did not complete in time");
    }

    /// Make an HTTP request to the test app and parse the JSON body
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let raw = self.request_raw(method, path, body, token).await;
        let body: Value = serde_json::from_slice(&raw.body).unwrap_or(Value::Null);

        TestResponse {
            status: raw.status,
            body,
        }
    }

    /// Make an HTTP request and return the unparsed response
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> RawResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        RawResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// Unparsed response for downloads and event streams
#[derive(Debug)]
pub struct RawResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body bytes
    pub body: Bytes,
}

/// Parse the `data:` payloads out of an SSE body.
pub fn sse_events(body: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("SSE payload should be JSON"))
        .collect()
}

/// Start a local stand-in for the mail relay on an ephemeral port.
///
/// Accepts every delivery with 204 and counts them, so tests can assert
/// how many items actually went out over the wire.
async fn spawn_relay() -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let app = Router::new().route(
        "/api/send",
        post(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            StatusCode::NO_CONTENT
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay listener");
    let addr = listener.local_addr().expect("Failed to read relay address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}/api/send"), hits)
}
