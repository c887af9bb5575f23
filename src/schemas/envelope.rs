use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// The `{ success, message, data }` wrapper every API response is sent in.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<T> {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) data: Option<T>,
}

pub(crate) type EnvelopeResponse<T> = (StatusCode, Json<Envelope<T>>);

impl<T: Serialize> Envelope<T> {
    pub(crate) fn success(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data) }
    }

    pub(crate) fn failure(message: impl Into<String>, data: Option<T>) -> Self {
        Self { success: false, message: message.into(), data }
    }
}

pub(crate) fn ok<T: Serialize>(message: &str, data: T) -> EnvelopeResponse<T> {
    (StatusCode::OK, Json(Envelope::success(message, data)))
}

pub(crate) fn created<T: Serialize>(message: &str, data: T) -> EnvelopeResponse<T> {
    (StatusCode::CREATED, Json(Envelope::success(message, data)))
}
