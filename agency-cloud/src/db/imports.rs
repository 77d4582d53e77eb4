//! `agency_imports` history

use shared::models::{ImportRecord, ImportReport};
use sqlx::PgPool;

pub async fn insert(
    pool: &PgPool,
    admin_id: &str,
    file_name: &str,
    report: &ImportReport,
    now: i64,
) -> Result<ImportRecord, sqlx::Error> {
    let errors = serde_json::to_value(&report.errors).ok();
    sqlx::query_as(
        r#"
        INSERT INTO agency_imports (
            admin_id, file_name, dry_run, total_rows, created_count, updated_count,
            skipped_count, error_count, errors, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(admin_id)
    .bind(file_name)
    .bind(report.dry_run)
    .bind(report.total_rows as i32)
    .bind(report.created as i32)
    .bind(report.updated as i32)
    .bind(report.skipped as i32)
    .bind(report.errors.len() as i32)
    .bind(errors)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<ImportRecord>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agency_imports")
        .fetch_one(pool)
        .await?;
    let rows: Vec<ImportRecord> =
        sqlx::query_as("SELECT * FROM agency_imports ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
    Ok((rows, total))
}
