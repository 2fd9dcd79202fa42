//! HTTP mapping for domain errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reformd_core::error::ReformdError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub ReformdError);

impl From<ReformdError> for ApiError {
    fn from(err: ReformdError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ReformdError::Validation { .. } => StatusCode::BAD_REQUEST,
            ReformdError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ReformdError::NotFound { .. } => StatusCode::NOT_FOUND,
            ReformdError::Database(_)
            | ReformdError::NotifierConfig(_)
            | ReformdError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        (status, Json(json!({ "ok": false, "error": self.0.to_string() }))).into_response()
    }
}
