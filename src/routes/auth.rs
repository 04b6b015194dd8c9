//! Calendar connection endpoints.
//!
//! The OAuth browser handshake happens outside this server; clients hand us
//! the resulting token pair and we hold it for the sync engines.

use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use taskcal_core::SyncError;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/{user}/status", get(status))
        .route("/api/auth/{user}/tokens", put(store_tokens))
        .route("/api/auth/{user}", delete(disconnect))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub connected: bool,
}

/// GET /api/auth/{user}/status
async fn status(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let _guard = state.ctx.store.lock_user(&user).await;
    let record = state.ctx.store.ensure_user(&user)?;

    Ok(Json(StatusResponse {
        connected: record.connected(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUpdate {
    #[serde(alias = "access_token")]
    pub access_token: String,
    #[serde(alias = "refresh_token")]
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub message: &'static str,
}

/// PUT /api/auth/{user}/tokens - store the pair produced by an external
/// OAuth flow.
///
/// Google only returns a refresh token on first consent, so an absent one
/// leaves any previously stored refresh token in place. Every token update
/// drops the sync cursor: a reconnect starts over from the lookback window.
async fn store_tokens(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(update): Json<TokenUpdate>,
) -> Result<Json<OkResponse>, AppError> {
    let _guard = state.ctx.store.lock_user(&user).await;

    let mut record = state.ctx.store.ensure_user(&user)?;
    record.access_token = Some(update.access_token);
    if update.refresh_token.is_some() {
        record.refresh_token = update.refresh_token;
    }
    record.sync_cursor = None;
    state.ctx.store.save_user(&user, &record)?;

    info!(user = %user, "calendar connected");
    Ok(Json(OkResponse { message: "connected" }))
}

/// DELETE /api/auth/{user} - disconnect the calendar.
async fn disconnect(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<OkResponse>, AppError> {
    let _guard = state.ctx.store.lock_user(&user).await;

    let mut record = state
        .ctx
        .store
        .load_user(&user)?
        .ok_or_else(|| SyncError::UserNotFound(user.clone()))?;
    record.clear_credentials();
    state.ctx.store.save_user(&user, &record)?;

    info!(user = %user, "calendar disconnected");
    Ok(Json(OkResponse {
        message: "disconnected",
    }))
}
