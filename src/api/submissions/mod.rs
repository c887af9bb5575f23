use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Router;
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::api::extract::{parse_document_id, JsonDocument};
use crate::core::state::AppState;
use crate::schemas::envelope::{self, EnvelopeResponse};
use crate::services::documents::{self, Document};
use crate::services::ownership;
use crate::store::{InsertOutcome, SubmissionFilter, UpdateOutcome};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/submit-assignment/:email", post(submit_assignment))
        .route("/user-assignments", get(missing_email))
        .route("/user-assignments/:email", get(list_user_submissions))
        .route("/pending-assignments", get(list_pending_submissions))
        .route("/assgnment-mark/:email/:id", patch(grade_submission))
}

async fn submit_assignment(
    State(state): State<AppState>,
    Path(email): Path<String>,
    JsonDocument(body): JsonDocument,
) -> Result<EnvelopeResponse<InsertOutcome>, ApiError> {
    let submission = documents::stamp_submission(body, &email, OffsetDateTime::now_utc());

    let outcome = state
        .store()
        .insert_submission(submission)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to submit assignment"))?;

    tracing::info!(
        submission_id = %outcome.inserted_id,
        submitted_by = %email,
        "assignment submitted"
    );

    Ok(envelope::created("Assignment submitted successfully", outcome))
}

fn invalid_email() -> ApiError {
    ApiError::BadRequest("Invalid email address provided".to_string())
}

async fn missing_email() -> ApiError {
    invalid_email()
}

async fn list_user_submissions(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<EnvelopeResponse<Vec<Document>>, ApiError> {
    if email.trim().is_empty() {
        return Err(invalid_email());
    }

    let submissions = state
        .store()
        .list_submissions(SubmissionFilter::SubmittedBy(email))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submissions"))?;

    if submissions.is_empty() {
        return Err(ApiError::EmptyListing("No assignments found for this user"));
    }

    Ok(envelope::ok("Assignments retrieved successfully", submissions))
}

async fn list_pending_submissions(
    State(state): State<AppState>,
) -> Result<EnvelopeResponse<Vec<Document>>, ApiError> {
    let submissions = state
        .store()
        .list_submissions(SubmissionFilter::NotCompleted)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load pending submissions"))?;

    if submissions.is_empty() {
        return Err(ApiError::EmptyListing("No pending assignments found"));
    }

    Ok(envelope::ok("Assignments retrieved successfully", submissions))
}

async fn grade_submission(
    State(state): State<AppState>,
    Path((email, id)): Path<(String, String)>,
    JsonDocument(body): JsonDocument,
) -> Result<EnvelopeResponse<UpdateOutcome>, ApiError> {
    let id = parse_document_id(&id)?;

    let submission = state
        .store()
        .find_submission(id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load submission"))?
        .ok_or(ApiError::NotFound("Assignment not found"))?;

    if ownership::is_submitter(&email, &submission) {
        tracing::warn!(submission_id = %id, examiner = %email, "self-grading refused");
        return Err(ApiError::Forbidden("You can't marked on your own assignment"));
    }

    let outcome = state
        .store()
        .grade_submission(id, &email, documents::grading_patch(body, &email))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?;

    tracing::info!(
        submission_id = %id,
        examiner = %email,
        matched = outcome.matched_count,
        "submission graded"
    );

    Ok(envelope::ok("Assignment updated successfully", outcome))
}
