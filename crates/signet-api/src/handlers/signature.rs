//! Per-signature handlers: count and single-file download.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use uuid::Uuid;

use signet_core::error::AppError;
use signet_core::types::SignatureId;

use crate::dto::request::UserScopeQuery;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/signatures/count?user_id=...
pub async fn signature_count(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<UserScopeQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let count = state
        .export_service
        .signature_count(&auth, query.user_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "count": count,
            "user_id": query.user_id,
        }
    })))
}

/// GET /api/signatures/{id}/download
pub async fn download_signature(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let rendered = state
        .export_service
        .render_single(&auth, SignatureId::from(id))
        .await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", rendered.filename),
        )
        .body(Body::from(rendered.html))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
