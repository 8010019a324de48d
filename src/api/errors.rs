use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Message returned to clients when a dependency failed; the cause only goes to the logs.
const UPSTREAM_FAILURE_MESSAGE: &str = "Something went wrong, please try again later";

/// Converts AppError into a JSON HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_upstream() {
            tracing::error!(error = %self, "Request failed on an upstream dependency");
        }

        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Database(_)
            | AppError::Unavailable(_)
            | AppError::Storage(_)
            | AppError::Notify(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                UPSTREAM_FAILURE_MESSAGE.to_string(),
            ),
            AppError::Config(msg) | AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    UPSTREAM_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}
