//! Per-user task document endpoints.
//!
//! The view layer reads and writes lists plus the active-list selector.
//! Credentials and the sync cursor are server-owned: they're redacted from
//! responses and preserved across document writes.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use taskcal_core::TaskList;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/data/{user}", get(get_data).post(save_data))
}

/// The document as the view layer sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub lists: Vec<TaskList>,
    pub active_list_id: String,
    pub connected: bool,
}

/// GET /api/data/{user} - read the document, creating the default on first
/// access.
async fn get_data(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<UserDataResponse>, AppError> {
    let _guard = state.ctx.store.lock_user(&user).await;
    let record = state.ctx.store.ensure_user(&user)?;

    Ok(Json(UserDataResponse {
        connected: record.connected(),
        lists: record.lists,
        active_list_id: record.active_list_id,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataUpdate {
    pub lists: Vec<TaskList>,
    pub active_list_id: String,
}

#[derive(Serialize)]
pub struct SavedResponse {
    pub message: &'static str,
}

/// POST /api/data/{user} - replace the document's lists and selector.
async fn save_data(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(update): Json<UserDataUpdate>,
) -> Result<Json<SavedResponse>, AppError> {
    let _guard = state.ctx.store.lock_user(&user).await;

    let mut record = state.ctx.store.ensure_user(&user)?;
    record.lists = update.lists;
    record.active_list_id = update.active_list_id;
    state.ctx.store.save_user(&user, &record)?;

    Ok(Json(SavedResponse { message: "saved" }))
}
