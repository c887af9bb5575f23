use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use crate::schemas::envelope::Envelope;

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    Forbidden(&'static str),
    NotFound(&'static str),
    /// 404 for a listing with no rows; the envelope carries `data: []`.
    EmptyListing(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message, None),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message.to_string(), None),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string(), None),
            ApiError::EmptyListing(message) => {
                (StatusCode::NOT_FOUND, message.to_string(), Some(Value::Array(Vec::new())))
            }
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message, None),
        };

        (status, Json(Envelope::failure(message, data))).into_response()
    }
}
