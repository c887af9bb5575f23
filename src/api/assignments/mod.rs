use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::api::errors::ApiError;
use crate::api::extract::{parse_document_id, JsonDocument};
use crate::core::state::AppState;
use crate::schemas::envelope::{self, EnvelopeResponse};
use crate::services::documents::{self, Document};
use crate::services::ownership;
use crate::store::{DeleteOutcome, InsertOutcome, UpdateOutcome};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/create-assignment", post(create_assignment))
        .route("/assignments", get(list_assignments))
        .route("/delete-assignment/:email/:id", delete(delete_assignment))
        .route("/update-assignment/:email/:id", put(update_assignment))
}

async fn create_assignment(
    State(state): State<AppState>,
    JsonDocument(assignment): JsonDocument,
) -> Result<EnvelopeResponse<InsertOutcome>, ApiError> {
    let outcome = state
        .store()
        .insert_assignment(documents::strip_identity(assignment))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    tracing::info!(assignment_id = %outcome.inserted_id, "assignment created");

    Ok(envelope::created("Assignment created successfully", outcome))
}

async fn list_assignments(
    State(state): State<AppState>,
) -> Result<EnvelopeResponse<Vec<Document>>, ApiError> {
    let assignments = state
        .store()
        .list_assignments()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignments"))?;

    Ok(envelope::ok("Assignments retrieved successfully", assignments))
}

async fn delete_assignment(
    State(state): State<AppState>,
    Path((email, id)): Path<(String, String)>,
) -> Result<EnvelopeResponse<DeleteOutcome>, ApiError> {
    let id = parse_document_id(&id)?;

    let assignment = state
        .store()
        .find_assignment(id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        .ok_or(ApiError::NotFound("Assignment not found"))?;

    if !ownership::is_owner(&email, &assignment) {
        tracing::warn!(assignment_id = %id, actor = %email, "assignment delete refused");
        return Err(ApiError::Forbidden("You are not authorized to delete this assignment"));
    }

    let outcome = state
        .store()
        .delete_assignment(id, &email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete assignment"))?;

    tracing::info!(
        assignment_id = %id,
        actor = %email,
        deleted = outcome.deleted_count,
        "assignment deleted"
    );

    Ok(envelope::ok("Assignment deleted successfully", outcome))
}

async fn update_assignment(
    State(state): State<AppState>,
    Path((email, id)): Path<(String, String)>,
    JsonDocument(patch): JsonDocument,
) -> Result<EnvelopeResponse<UpdateOutcome>, ApiError> {
    let id = parse_document_id(&id)?;

    let assignment = state
        .store()
        .find_assignment(id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load assignment"))?
        .ok_or(ApiError::NotFound("Assignment not found"))?;

    if !ownership::is_owner(&email, &assignment) {
        tracing::warn!(assignment_id = %id, actor = %email, "assignment update refused");
        return Err(ApiError::Forbidden("You are not authorized to update this assignment"));
    }

    let outcome = state
        .store()
        .update_assignment(id, &email, documents::strip_identity(patch))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update assignment"))?;

    tracing::info!(
        assignment_id = %id,
        actor = %email,
        modified = outcome.modified_count,
        "assignment updated"
    );

    Ok(envelope::ok("Assignment updated successfully", outcome))
}
