//! The document store behind every handler.
//!
//! Handlers only see [`DocumentStore`]; production wires in [`postgres::PgDocumentStore`]
//! and tests swap in an in-memory implementation.

pub(crate) mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::services::documents::Document;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertOutcome {
    pub(crate) acknowledged: bool,
    pub(crate) inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateOutcome {
    pub(crate) acknowledged: bool,
    pub(crate) matched_count: u64,
    pub(crate) modified_count: u64,
    pub(crate) upserted_id: Option<String>,
    pub(crate) upserted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteOutcome {
    pub(crate) acknowledged: bool,
    pub(crate) deleted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmissionFilter {
    SubmittedBy(String),
    /// Any status other than `"completed"`, including a missing one.
    NotCompleted,
}

impl InsertOutcome {
    pub(crate) fn inserted(id: impl Into<String>) -> Self {
        Self { acknowledged: true, inserted_id: id.into() }
    }
}

impl UpdateOutcome {
    /// `None` means the guarded update matched nothing.
    pub(crate) fn from_merge(merged: Option<bool>) -> Self {
        let (matched_count, modified_count) = match merged {
            None => (0, 0),
            Some(false) => (1, 0),
            Some(true) => (1, 1),
        };
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

impl DeleteOutcome {
    pub(crate) fn deleted(deleted_count: u64) -> Self {
        Self { acknowledged: true, deleted_count }
    }
}

/// Persistence for assignments and submissions.
///
/// Mutations are conditional on the same ownership predicate the handlers check up front,
/// so a record that changes hands between the lookup and the write is left alone and the
/// outcome reports zero matches.
#[async_trait]
pub(crate) trait DocumentStore: Send + Sync {
    async fn insert_assignment(&self, doc: Document) -> Result<InsertOutcome, StoreError>;

    async fn list_assignments(&self) -> Result<Vec<Document>, StoreError>;

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Deletes the assignment while `createdBy.email == owner`.
    async fn delete_assignment(&self, id: Uuid, owner: &str)
        -> Result<DeleteOutcome, StoreError>;

    /// Merges `patch` into the assignment while `createdBy.email == owner`.
    async fn update_assignment(
        &self,
        id: Uuid,
        owner: &str,
        patch: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn insert_submission(&self, doc: Document) -> Result<InsertOutcome, StoreError>;

    async fn find_submission(&self, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Submissions with an `assignmentDetails` array attached to each.
    async fn list_submissions(
        &self,
        filter: SubmissionFilter,
    ) -> Result<Vec<Document>, StoreError>;

    /// Merges `patch` into the submission unless `submittedBy == examiner`.
    async fn grade_submission(
        &self,
        id: Uuid,
        examiner: &str,
        patch: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
