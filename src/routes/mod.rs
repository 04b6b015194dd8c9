pub mod auth;
pub mod data;
pub mod sync;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use taskcal_core::SyncError;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert engine/route errors to HTTP responses.
///
/// Provider failures map to 502 so the view layer can tell "the calendar
/// service misbehaved, your edit is saved" apart from local faults.
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<SyncError>() {
            Some(SyncError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            Some(SyncError::NotConnected) => StatusCode::UNAUTHORIZED,
            Some(SyncError::Provider(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
