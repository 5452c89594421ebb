use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medbot_rag::RagError;
use serde_json::json;
use thiserror::Error;

/// Failures returned to HTTP clients as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Wrap a pipeline failure the way the chat endpoint reports it.
    pub fn internal(err: &RagError) -> Self {
        ApiError::Internal(format!("Internal server error: {err}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
