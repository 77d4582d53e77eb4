//! `agency_profile_edits` audit trail

use serde_json::Value;
use shared::models::{FieldChange, ProfileEdit};
use sqlx::PgPool;

pub async fn insert<'e, E>(
    executor: E,
    agency_id: i64,
    editor_id: Option<&str>,
    field_name: &str,
    old_value: &Value,
    new_value: &Value,
    now: i64,
) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO agency_profile_edits (agency_id, editor_id, field_name, old_value, new_value, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(agency_id)
    .bind(editor_id)
    .bind(field_name)
    .bind(old_value)
    .bind(new_value)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// One row per changed field
pub async fn insert_changes(
    tx: &mut sqlx::PgConnection,
    agency_id: i64,
    editor_id: Option<&str>,
    changes: &[FieldChange],
    now: i64,
) -> Result<(), sqlx::Error> {
    for change in changes {
        insert(&mut *tx, agency_id, editor_id, change.field, &change.old, &change.new, now).await?;
    }
    Ok(())
}

pub async fn list(
    pool: &PgPool,
    agency_id: i64,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ProfileEdit>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agency_profile_edits WHERE agency_id = $1")
        .bind(agency_id)
        .fetch_one(pool)
        .await?;

    let rows: Vec<ProfileEdit> = sqlx::query_as(
        "SELECT * FROM agency_profile_edits WHERE agency_id = $1
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(agency_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}
