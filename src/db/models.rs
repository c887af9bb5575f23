use serde_json::Value;
use sqlx::types::Json;

use crate::services::documents::{self, Document};

/// A collection row: the store-assigned id plus the client document.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct DocumentRow {
    pub(crate) id: String,
    pub(crate) doc: Json<Value>,
}

/// A submission row joined with the assignments its `assignmentId` resolves to.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SubmissionDetailsRow {
    pub(crate) id: String,
    pub(crate) doc: Json<Value>,
    pub(crate) assignment_details: Json<Value>,
}

impl DocumentRow {
    pub(crate) fn into_document(self) -> Document {
        documents::with_identity(self.id, object_or_empty(self.doc.0))
    }
}

impl SubmissionDetailsRow {
    pub(crate) fn into_document(self) -> Document {
        let details = match self.assignment_details.0 {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        let mut document = documents::with_identity(self.id, object_or_empty(self.doc.0));
        document.insert(documents::ASSIGNMENT_DETAILS.to_string(), Value::Array(details));
        document
    }
}

// The column only ever receives objects; anything else is treated as empty.
fn object_or_empty(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}
