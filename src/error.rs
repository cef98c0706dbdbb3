use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum SummariseError {
    /// Client sent something unusable. Never worth retrying.
    #[error("{0}")]
    Validation(String),

    /// Model not loaded yet, or already unloaded. Caller may retry later.
    #[error("Model not loaded yet")]
    ServiceUnavailable,

    #[error("model invocation failed: {0:#}")]
    ModelInvocation(#[source] anyhow::Error),
}

impl SummariseError {
    pub fn status(&self) -> StatusCode {
        match self {
            SummariseError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SummariseError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            SummariseError::ModelInvocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SummariseError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Model failures stay in the log; the client only sees a generic error.
        let detail = match &self {
            SummariseError::ModelInvocation(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
