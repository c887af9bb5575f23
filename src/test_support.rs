use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::documents::{self, Document, STATUS, STATUS_COMPLETED};
use crate::services::ownership;
use crate::store::postgres::PgDocumentStore;
use crate::store::{
    DeleteOutcome, DocumentStore, InsertOutcome, StoreError, SubmissionFilter, UpdateOutcome,
};

// Kept apart from DATABASE_URL, which the config tests clear.
const TEST_DATABASE_URL_VAR: &str = "TEST_DATABASE_URL";
const ASSIGNMENT_ID: &str = "assignmentId";

pub(crate) struct TestContext {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("ASSIGNMENTS_ENV", "test");
    std::env::set_var("ASSIGNMENTS_STRICT_CONFIG", "0");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("ASSIGNMENTS_PORT");
    std::env::remove_var("DATABASE_URL");
    std::env::remove_var("DB_MAX_CONNECTIONS");
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let store = Arc::new(MemoryStore::default());
    let state = AppState::new(settings, store.clone());
    let app = api::router::router(state);

    TestContext { store, app, _guard: guard }
}

pub(crate) struct StoreContext {
    pub(crate) store: PgDocumentStore,
    _guard: OwnedMutexGuard<()>,
}

/// A migrated, emptied PostgreSQL store, or `None` when `TEST_DATABASE_URL` is unset.
pub(crate) async fn setup_store_context() -> Option<StoreContext> {
    let guard = env_lock().await;

    let Some(database_url) =
        std::env::var(TEST_DATABASE_URL_VAR).ok().filter(|url| !url.trim().is_empty())
    else {
        eprintln!("{TEST_DATABASE_URL_VAR} not set; skipping store test");
        return None;
    };

    let pool =
        PgPoolOptions::new().max_connections(2).connect(&database_url).await.expect("db pool");
    crate::db::run_migrations(&pool).await.expect("migrations");
    reset_db(&pool).await.expect("reset db");

    Some(StoreContext { store: PgDocumentStore::new(pool), _guard: guard })
}

async fn reset_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("TRUNCATE assignments, submitted_assignments").execute(pool).await?;
    Ok(())
}

pub(crate) fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// In-memory [`DocumentStore`] mirroring the PostgreSQL semantics: insertion order,
/// top-level merges, conditional writes and the lenient assignment join.
#[derive(Default)]
pub(crate) struct MemoryStore {
    assignments: Mutex<Vec<(String, Document)>>,
    submissions: Mutex<Vec<(String, Document)>>,
}

impl MemoryStore {
    pub(crate) async fn assignment_count(&self) -> usize {
        self.assignments.lock().await.len()
    }
}

fn merge(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

/// The `assignmentId` a submission points at, trimmed and lowercased like the SQL join.
fn referenced_assignment(submission: &Document) -> Option<String> {
    submission.get(ASSIGNMENT_ID).and_then(Value::as_str).map(|raw| raw.trim().to_lowercase())
}

fn is_completed(submission: &Document) -> bool {
    submission.get(STATUS).and_then(Value::as_str) == Some(STATUS_COMPLETED)
}

fn merge_where(
    rows: &mut [(String, Document)],
    id: Uuid,
    allowed: impl Fn(&Document) -> bool,
    patch: Document,
) -> UpdateOutcome {
    let id = id.to_string();
    let Some((_, doc)) = rows.iter_mut().find(|(row_id, doc)| *row_id == id && allowed(doc))
    else {
        return UpdateOutcome::from_merge(None);
    };

    let before = doc.clone();
    merge(doc, patch);
    UpdateOutcome::from_merge(Some(*doc != before))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_assignment(&self, doc: Document) -> Result<InsertOutcome, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.assignments.lock().await.push((id.clone(), doc));
        Ok(InsertOutcome::inserted(id))
    }

    async fn list_assignments(&self) -> Result<Vec<Document>, StoreError> {
        let rows = self.assignments.lock().await;
        Ok(rows.iter().map(|(id, doc)| documents::with_identity(id.clone(), doc.clone())).collect())
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        let rows = self.assignments.lock().await;
        Ok(rows
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(row_id, doc)| documents::with_identity(row_id.clone(), doc.clone())))
    }

    async fn delete_assignment(
        &self,
        id: Uuid,
        owner: &str,
    ) -> Result<DeleteOutcome, StoreError> {
        let id = id.to_string();
        let mut rows = self.assignments.lock().await;
        let before = rows.len();
        rows.retain(|(row_id, doc)| !(*row_id == id && ownership::is_owner(owner, doc)));
        Ok(DeleteOutcome::deleted((before - rows.len()) as u64))
    }

    async fn update_assignment(
        &self,
        id: Uuid,
        owner: &str,
        patch: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut rows = self.assignments.lock().await;
        Ok(merge_where(&mut rows, id, |doc| ownership::is_owner(owner, doc), patch))
    }

    async fn insert_submission(&self, doc: Document) -> Result<InsertOutcome, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.submissions.lock().await.push((id.clone(), doc));
        Ok(InsertOutcome::inserted(id))
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        let rows = self.submissions.lock().await;
        Ok(rows
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(row_id, doc)| documents::with_identity(row_id.clone(), doc.clone())))
    }

    async fn list_submissions(
        &self,
        filter: SubmissionFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let assignments = self.list_assignments().await?;
        let rows = self.submissions.lock().await;

        Ok(rows
            .iter()
            .filter(|(_, doc)| match &filter {
                SubmissionFilter::SubmittedBy(email) => ownership::is_submitter(email, doc),
                SubmissionFilter::NotCompleted => !is_completed(doc),
            })
            .map(|(id, doc)| {
                let reference = referenced_assignment(doc);
                let details = assignments
                    .iter()
                    .filter(|assignment| {
                        reference.is_some()
                            && assignment.get(documents::ID).and_then(Value::as_str)
                                == reference.as_deref()
                    })
                    .cloned()
                    .map(Value::Object)
                    .collect();
                let mut document = documents::with_identity(id.clone(), doc.clone());
                document.insert(documents::ASSIGNMENT_DETAILS.to_string(), Value::Array(details));
                document
            })
            .collect())
    }

    async fn grade_submission(
        &self,
        id: Uuid,
        examiner: &str,
        patch: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut rows = self.submissions.lock().await;
        Ok(merge_where(&mut rows, id, |doc| !ownership::is_submitter(examiner, doc), patch))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_replaces_top_level_fields_only() {
        let mut target = object(json!({"title": "Old", "meta": {"a": 1, "b": 2}, "keep": true}));
        merge(&mut target, object(json!({"title": "New", "meta": {"a": 3}})));

        assert_eq!(
            Value::Object(target),
            json!({"title": "New", "meta": {"a": 3}, "keep": true})
        );
    }

    #[test]
    fn referenced_assignment_is_normalised() {
        let submission = object(json!({"assignmentId": "  ABC-def "}));
        assert_eq!(referenced_assignment(&submission).as_deref(), Some("abc-def"));
        assert_eq!(referenced_assignment(&object(json!({"assignmentId": 7}))), None);
    }

    #[test]
    fn completion_requires_exact_status() {
        assert!(is_completed(&object(json!({"status": "completed"}))));
        assert!(!is_completed(&object(json!({"status": "reviewing"}))));
        assert!(!is_completed(&object(json!({}))));
    }
}
