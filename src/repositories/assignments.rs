use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::DocumentRow;
use crate::repositories::MergeResult;
use crate::services::documents::Document;

pub(crate) const COLLECTION: &str = "assignments";

pub(crate) async fn insert(
    pool: &PgPool,
    id: &str,
    doc: &Document,
    created_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO assignments (id, doc, created_at) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(Json(doc))
        .bind(created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT id, doc FROM assignments ORDER BY created_at, id")
        .fetch_all(pool)
        .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT id, doc FROM assignments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Deletes only while `createdBy.email` still equals `owner`. Returns rows removed.
pub(crate) async fn delete_owned_by(
    pool: &PgPool,
    id: &str,
    owner: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM assignments
         WHERE id = $1 AND doc #> '{createdBy,email}' = to_jsonb($2::text)",
    )
    .bind(id)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn merge_owned_by(
    pool: &PgPool,
    id: &str,
    owner: &str,
    patch: &Document,
) -> Result<MergeResult, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "WITH previous AS (
             SELECT id, doc FROM assignments
             WHERE id = $1 AND doc #> '{createdBy,email}' = to_jsonb($2::text)
             FOR UPDATE
         )
         UPDATE assignments AS a
         SET doc = previous.doc || $3
         FROM previous
         WHERE a.id = previous.id
         RETURNING a.doc IS DISTINCT FROM previous.doc",
    )
    .bind(id)
    .bind(owner)
    .bind(Json(patch))
    .fetch_optional(pool)
    .await
}
