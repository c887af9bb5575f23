use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::services::documents::Document;

/// A JSON request body that must be an object. Anything else is a 400 in the envelope.
pub(crate) struct JsonDocument(pub(crate) Document);

#[async_trait]
impl<S> FromRequest<S> for JsonDocument
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        match value {
            Value::Object(document) => Ok(Self(document)),
            _ => Err(ApiError::BadRequest("Request body must be a JSON object".to_string())),
        }
    }
}

pub(crate) fn parse_document_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest("Invalid identifier provided".to_string()))
}
