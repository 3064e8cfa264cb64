//! Export job handlers: create, poll, download, CSV.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;

use signet_auth::token;
use signet_core::error::AppError;

use crate::dto::request::{CreateExportRequest, UserScopeQuery};
use crate::dto::response::ExportJobResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/exports
///
/// Plans the job and runs chunk 0 before responding, so small exports are
/// already complete when the client sees the job id.
pub async fn create_export(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateExportRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let job = state
        .export_service
        .initiate(&auth, payload.owner_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "job_id": job.id,
            "total": job.total_items,
            "chunks": job.chunks_total,
            "message": format!(
                "Export of {} signatures planned in {} chunks",
                job.total_items, job.chunks_total
            ),
        }
    })))
}

/// GET /api/exports/{job_id}
pub async fn export_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    check_job_id(&job_id)?;

    let job = state.export_service.status(&auth, &job_id).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": ExportJobResponse::from(job),
    })))
}

/// GET /api/exports/{job_id}/download
///
/// Streams the final archive. Dropping the stream, on completion or on
/// client abort, removes the spool files and the job row.
pub async fn download_export(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    check_job_id(&job_id)?;

    let download = state.assembler.assemble(&auth, &job_id).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.filename),
        )
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

/// GET /api/exports/csv?user_id=...
pub async fn export_csv(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserScopeQuery>,
) -> ApiResult<Response> {
    let csv = state.export_service.export_csv(&auth, query.user_id).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(header::CONTENT_LENGTH, csv.bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", csv.filename),
        )
        .body(Body::from(csv.bytes))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

/// Job ids are 32 lowercase hex chars; anything else is rejected before it
/// reaches the database.
fn check_job_id(job_id: &str) -> Result<(), AppError> {
    if token::is_valid_format(job_id) {
        Ok(())
    } else {
        Err(AppError::validation("Invalid export job id"))
    }
}
