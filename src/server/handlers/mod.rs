pub mod health;
pub mod index;
pub mod metrics;
pub mod search;
pub mod vectors;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::VecdexError;

/// Wrapper that converts `VecdexError` into an HTTP response.
pub struct ApiError(pub VecdexError);

impl From<VecdexError> for ApiError {
    fn from(e: VecdexError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = json!({
            "error": self.0.to_string(),
            "status": status,
        });
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            axum::Json(body),
        )
            .into_response()
    }
}
