//! HTTP error mapping for the store.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::AuthError;
use crate::error::BucketKvError;

/// Error wrapper for converting store errors to HTTP responses.
pub struct ApiError(pub BucketKvError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BucketKvError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "Bucket and key must not be empty".to_string(),
            ),
            BucketKvError::NotFound => (StatusCode::NOT_FOUND, "Key not found".to_string()),
            err => {
                log::error!("request failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        error_response(status, message)
    }
}

impl From<BucketKvError> for ApiError {
    fn from(err: BucketKvError) -> Self {
        ApiError(err)
    }
}

/// Response for a request the access gate refused.
pub struct Unauthorized(pub AuthError);

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        error_response(StatusCode::UNAUTHORIZED, self.0.to_string())
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
