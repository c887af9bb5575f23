use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{DocumentRow, SubmissionDetailsRow};
use crate::repositories::MergeResult;
use crate::services::documents::{Document, STATUS_COMPLETED};
use crate::store::SubmissionFilter;

pub(crate) const COLLECTION: &str = "submitted_assignments";

pub(crate) async fn insert(
    pool: &PgPool,
    id: &str,
    doc: &Document,
    created_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO submitted_assignments (id, doc, created_at) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(Json(doc))
        .bind(created_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT id, doc FROM submitted_assignments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Submissions matching `filter`, each left-joined with the assignments its
/// `assignmentId` resolves to. Ids that resolve to nothing yield an empty array.
pub(crate) async fn list_with_details(
    pool: &PgPool,
    filter: &SubmissionFilter,
) -> Result<Vec<SubmissionDetailsRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(
        "SELECT s.id,
                s.doc,
                COALESCE(
                    (SELECT jsonb_agg(a.doc || jsonb_build_object('_id', a.id)
                                      ORDER BY a.created_at, a.id)
                     FROM assignments a
                     WHERE a.id = lower(btrim(s.doc ->> 'assignmentId'))),
                    '[]'::jsonb
                ) AS assignment_details
         FROM submitted_assignments s
         WHERE ",
    );

    match filter {
        SubmissionFilter::SubmittedBy(email) => {
            builder.push("s.doc -> 'submittedBy' = to_jsonb(");
            builder.push_bind(email.as_str());
            builder.push("::text)");
        }
        SubmissionFilter::NotCompleted => {
            builder.push("s.doc -> 'status' IS DISTINCT FROM to_jsonb(");
            builder.push_bind(STATUS_COMPLETED);
            builder.push("::text)");
        }
    }

    builder.push(" ORDER BY s.created_at, s.id");

    builder.build_query_as::<SubmissionDetailsRow>().fetch_all(pool).await
}

/// Merges `patch` unless the submission was submitted by `examiner`.
pub(crate) async fn merge_unless_submitted_by(
    pool: &PgPool,
    id: &str,
    examiner: &str,
    patch: &Document,
) -> Result<MergeResult, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "WITH previous AS (
             SELECT id, doc FROM submitted_assignments
             WHERE id = $1 AND doc -> 'submittedBy' IS DISTINCT FROM to_jsonb($2::text)
             FOR UPDATE
         )
         UPDATE submitted_assignments AS s
         SET doc = previous.doc || $3
         FROM previous
         WHERE s.id = previous.id
         RETURNING s.doc IS DISTINCT FROM previous.doc",
    )
    .bind(id)
    .bind(examiner)
    .bind(Json(patch))
    .fetch_optional(pool)
    .await
}
