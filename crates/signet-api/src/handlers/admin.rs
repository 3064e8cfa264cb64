//! Admin-only handlers.

use axum::Json;
use axum::extract::{Query, State};

use signet_core::error::AppError;
use signet_core::types::PageResponse;
use signet_entity::DispatchLogEntry;

use crate::dto::request::DispatchLogFilter;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// GET /api/admin/dispatch-log?page=&page_size=&status=
pub async fn dispatch_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
    Query(filter): Query<DispatchLogFilter>,
) -> ApiResult<Json<ApiResponse<PageResponse<DispatchLogEntry>>>> {
    if !auth.is_admin() {
        return Err(AppError::authorization("The dispatch log is admin-only").into());
    }

    let page = state
        .dispatch_log_repo
        .find_all(&params.into_page_request(), filter.status)
        .await?;

    Ok(Json(ApiResponse::ok(page)))
}
