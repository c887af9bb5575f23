use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::metrics;
use crate::core::time::primitive_now_utc;
use crate::repositories::{assignments, submissions};
use crate::services::documents::Document;
use crate::store::{
    DeleteOutcome, DocumentStore, InsertOutcome, StoreError, SubmissionFilter, UpdateOutcome,
};

#[derive(Clone)]
pub(crate) struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_assignment(&self, doc: Document) -> Result<InsertOutcome, StoreError> {
        let id = Uuid::new_v4().to_string();
        assignments::insert(&self.pool, &id, &doc, primitive_now_utc()).await?;
        metrics::record_write(assignments::COLLECTION, "insert");
        Ok(InsertOutcome::inserted(id))
    }

    async fn list_assignments(&self) -> Result<Vec<Document>, StoreError> {
        let rows = assignments::list_all(&self.pool).await?;
        Ok(rows.into_iter().map(|row| row.into_document()).collect())
    }

    async fn find_assignment(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = assignments::find_by_id(&self.pool, &id.to_string()).await?;
        Ok(row.map(|row| row.into_document()))
    }

    async fn delete_assignment(
        &self,
        id: Uuid,
        owner: &str,
    ) -> Result<DeleteOutcome, StoreError> {
        let deleted = assignments::delete_owned_by(&self.pool, &id.to_string(), owner).await?;
        metrics::record_write(assignments::COLLECTION, "delete");
        Ok(DeleteOutcome::deleted(deleted))
    }

    async fn update_assignment(
        &self,
        id: Uuid,
        owner: &str,
        patch: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let merged =
            assignments::merge_owned_by(&self.pool, &id.to_string(), owner, &patch).await?;
        metrics::record_write(assignments::COLLECTION, "update");
        Ok(UpdateOutcome::from_merge(merged))
    }

    async fn insert_submission(&self, doc: Document) -> Result<InsertOutcome, StoreError> {
        let id = Uuid::new_v4().to_string();
        submissions::insert(&self.pool, &id, &doc, primitive_now_utc()).await?;
        metrics::record_write(submissions::COLLECTION, "insert");
        Ok(InsertOutcome::inserted(id))
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        let row = submissions::find_by_id(&self.pool, &id.to_string()).await?;
        Ok(row.map(|row| row.into_document()))
    }

    async fn list_submissions(
        &self,
        filter: SubmissionFilter,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = submissions::list_with_details(&self.pool, &filter).await?;
        Ok(rows.into_iter().map(|row| row.into_document()).collect())
    }

    async fn grade_submission(
        &self,
        id: Uuid,
        examiner: &str,
        patch: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let merged =
            submissions::merge_unless_submitted_by(&self.pool, &id.to_string(), examiner, &patch)
                .await?;
        metrics::record_write(submissions::COLLECTION, "update");
        Ok(UpdateOutcome::from_merge(merged))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::db::ping(&self.pool).await?;
        Ok(())
    }
}
