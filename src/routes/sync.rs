//! On-demand outbound sync endpoint.
//!
//! The view layer calls this after every task edit; the engine persists the
//! edit first, then reconciles the linked calendar event.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use taskcal_core::{outbound, SyncOutcome, Task};

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/sync/{user}", post(sync_task))
}

#[derive(Deserialize)]
pub struct SyncRequest {
    pub task: Task,
}

/// POST /api/sync/{user} - push one task's state to the calendar.
async fn sync_task(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncOutcome>, AppError> {
    let outcome = outbound::sync_and_persist(&state.ctx, &user, req.task).await?;
    Ok(Json(outcome))
}
