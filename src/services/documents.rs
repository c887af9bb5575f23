//! Helpers for the free-form JSON documents kept in both collections.

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::core::time::format_offset;

pub(crate) type Document = Map<String, Value>;

pub(crate) const ID: &str = "_id";
pub(crate) const ASSIGNMENT_DETAILS: &str = "assignmentDetails";
pub(crate) const STATUS: &str = "status";
pub(crate) const SUBMITTED_BY: &str = "submittedBy";
pub(crate) const SUBMITTED_AT: &str = "submittedAt";
pub(crate) const EXAMINER: &str = "examiner";

pub(crate) const STATUS_PENDING: &str = "pending";
pub(crate) const STATUS_COMPLETED: &str = "completed";

/// Identity is owned by the store; a client-supplied `_id` never reaches it.
pub(crate) fn strip_identity(mut document: Document) -> Document {
    document.remove(ID);
    document
}

pub(crate) fn with_identity(id: String, mut document: Document) -> Document {
    document.insert(ID.to_string(), Value::String(id));
    document
}

/// New submission: the client body with the server-controlled fields forced on top.
pub(crate) fn stamp_submission(
    body: Document,
    submitted_by: &str,
    submitted_at: OffsetDateTime,
) -> Document {
    let mut document = strip_identity(body);
    document.insert(STATUS.to_string(), Value::String(STATUS_PENDING.to_string()));
    document.insert(SUBMITTED_BY.to_string(), Value::String(submitted_by.to_string()));
    document.insert(SUBMITTED_AT.to_string(), Value::String(format_offset(submitted_at)));
    document
}

pub(crate) fn grading_patch(body: Document, examiner: &str) -> Document {
    let mut patch = strip_identity(body);
    patch.insert(EXAMINER.to_string(), Value::String(examiner.to_string()));
    patch.insert(STATUS.to_string(), Value::String(STATUS_COMPLETED.to_string()));
    patch
}
