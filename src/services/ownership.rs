use serde_json::Value;

use crate::services::documents::{Document, SUBMITTED_BY};

/// `actor` owns an assignment when it equals the stored `createdBy.email`.
pub(crate) fn is_owner(actor: &str, assignment: &Document) -> bool {
    assignment
        .get("createdBy")
        .and_then(|created_by| created_by.get("email"))
        .and_then(Value::as_str)
        .is_some_and(|email| email == actor)
}

/// Used to refuse self-grading. A submission with no recorded submitter matches nobody.
pub(crate) fn is_submitter(actor: &str, submission: &Document) -> bool {
    submission.get(SUBMITTED_BY).and_then(Value::as_str).is_some_and(|email| email == actor)
}
