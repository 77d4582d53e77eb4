//! Audit log of moderation and account actions

use serde::Serialize;
use sqlx::PgPool;

use super::BoxError;

/// Entry to append
pub struct AuditRecord<'a> {
    pub actor_id: Option<&'a str>,
    pub action: &'a str,
    pub target_type: &'a str,
    pub target_id: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<&'a str>,
}

/// Write an audit log entry
pub async fn log(pool: &PgPool, record: &AuditRecord<'_>, now: i64) -> Result<(), BoxError> {
    sqlx::query(
        "INSERT INTO audit_logs (actor_id, action, target_type, target_id, detail, ip_address, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(record.actor_id)
    .bind(record.action)
    .bind(record.target_type)
    .bind(&record.target_id)
    .bind(&record.detail)
    .bind(record.ip_address)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(sqlx::FromRow, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub actor_id: Option<String>,
    pub actor_email: Option<String>,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: i64,
}

/// Newest first
pub async fn query(pool: &PgPool, limit: i64, offset: i64) -> Result<(Vec<AuditEntry>, i64), BoxError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
        .fetch_one(pool)
        .await?;

    let rows: Vec<AuditEntry> = sqlx::query_as(
        "SELECT l.id, l.actor_id, u.email AS actor_email, l.action, l.target_type, l.target_id,
                l.detail, l.ip_address, l.created_at
         FROM audit_logs l
         LEFT JOIN users u ON u.id = l.actor_id
         ORDER BY l.created_at DESC, l.id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok((rows, total))
}
