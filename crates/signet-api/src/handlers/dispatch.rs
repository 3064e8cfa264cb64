//! Bulk dispatch handler with SSE progress streaming.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use validator::Validate;

use signet_core::error::AppError;

use crate::dto::request::DispatchRequest;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Buffered progress events; the engine blocks on a full buffer rather
/// than outrunning a slow client.
const EVENT_BUFFER: usize = 32;

/// POST /api/dispatch
///
/// Admin-only. Validates the batch up front with plain HTTP errors, then
/// switches to an SSE stream: one event per item plus a terminal summary.
/// When the client disconnects, the receiver drops and the engine stops
/// after the in-flight item.
pub async fn run_dispatch(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<DispatchRequest>,
) -> ApiResult<Response> {
    if !auth.is_admin() {
        return Err(AppError::authorization("Bulk dispatch is admin-only").into());
    }

    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let max_items = state.config.dispatch.max_items;
    if payload.item_ids.len() > max_items {
        return Err(AppError::validation(format!(
            "A dispatch batch is limited to {max_items} items"
        ))
        .into());
    }

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let engine = Arc::clone(&state.dispatch_engine);
    let ctx = auth.0;
    tokio::spawn(async move {
        engine.run(&ctx, payload.item_ids, tx).await;
    });

    let stream = ReceiverStream::new(rx).map(|event| SseEvent::default().json_data(&event));

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response())
}
