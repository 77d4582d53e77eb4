//! Compliance items and the expiry alert log

use chrono::NaiveDate;
use shared::compliance::AlertLevel;
use shared::models::{ComplianceItem, ComplianceItemCreate, ComplianceItemUpdate};
use sqlx::PgPool;

use super::patch_value;

pub async fn list_for_agency(pool: &PgPool, agency_id: i64) -> Result<Vec<ComplianceItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM compliance_items WHERE agency_id = $1
         ORDER BY expiration_date ASC NULLS LAST, id",
    )
    .bind(agency_id)
    .fetch_all(pool)
    .await
}

/// Verified items that have not expired as of `today`
pub async fn list_public(
    pool: &PgPool,
    agency_id: i64,
    today: NaiveDate,
) -> Result<Vec<ComplianceItem>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM compliance_items
         WHERE agency_id = $1 AND is_verified
           AND (expiration_date IS NULL OR expiration_date >= $2)
         ORDER BY compliance_type, title",
    )
    .bind(agency_id)
    .bind(today)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<ComplianceItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM compliance_items WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Item scoped to its agency
pub async fn find(pool: &PgPool, agency_id: i64, id: i64) -> Result<Option<ComplianceItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM compliance_items WHERE id = $1 AND agency_id = $2")
        .bind(id)
        .bind(agency_id)
        .fetch_optional(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    agency_id: i64,
    data: &ComplianceItemCreate,
    now: i64,
) -> Result<ComplianceItem, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO compliance_items (
            agency_id, compliance_type, title, issuer, certificate_number,
            issued_date, expiration_date, document_url, notes, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING *
        "#,
    )
    .bind(agency_id)
    .bind(data.compliance_type.as_db())
    .bind(data.title.trim())
    .bind(&data.issuer)
    .bind(&data.certificate_number)
    .bind(data.issued_date)
    .bind(data.expiration_date)
    .bind(&data.document_url)
    .bind(&data.notes)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: i64,
    data: &ComplianceItemUpdate,
    clear_verification: bool,
    now: i64,
) -> Result<Option<ComplianceItem>, sqlx::Error> {
    let (issuer_set, issuer) = patch_value(&data.issuer);
    let (number_set, certificate_number) = patch_value(&data.certificate_number);
    let (issued_set, issued_date) = patch_value(&data.issued_date);
    let (expiration_set, expiration_date) = patch_value(&data.expiration_date);
    let (document_set, document_url) = patch_value(&data.document_url);
    let (notes_set, notes) = patch_value(&data.notes);

    sqlx::query_as(
        r#"
        UPDATE compliance_items SET
            compliance_type = COALESCE($1, compliance_type),
            title = COALESCE($2, title),
            issuer = CASE WHEN $3 THEN $4 ELSE issuer END,
            certificate_number = CASE WHEN $5 THEN $6 ELSE certificate_number END,
            issued_date = CASE WHEN $7 THEN $8 ELSE issued_date END,
            expiration_date = CASE WHEN $9 THEN $10 ELSE expiration_date END,
            document_url = CASE WHEN $11 THEN $12 ELSE document_url END,
            notes = CASE WHEN $13 THEN $14 ELSE notes END,
            is_verified = CASE WHEN $15 THEN FALSE ELSE is_verified END,
            verified_by = CASE WHEN $15 THEN NULL ELSE verified_by END,
            verified_at = CASE WHEN $15 THEN NULL ELSE verified_at END,
            updated_at = $16
        WHERE id = $17
        RETURNING *
        "#,
    )
    .bind(data.compliance_type.map(|t| t.as_db()))
    .bind(data.title.as_deref().map(str::trim))
    .bind(issuer_set)
    .bind(issuer)
    .bind(number_set)
    .bind(certificate_number)
    .bind(issued_set)
    .bind(issued_date)
    .bind(expiration_set)
    .bind(expiration_date)
    .bind(document_set)
    .bind(document_url)
    .bind(notes_set)
    .bind(notes)
    .bind(clear_verification)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, agency_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM compliance_items WHERE id = $1 AND agency_id = $2")
        .bind(id)
        .bind(agency_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn verify(
    pool: &PgPool,
    id: i64,
    admin_id: &str,
    now: i64,
) -> Result<Option<ComplianceItem>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE compliance_items SET is_verified = TRUE, verified_by = $1, verified_at = $2, updated_at = $2
         WHERE id = $3 RETURNING *",
    )
    .bind(admin_id)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

// ── Expiry sweep ──

/// Item within the alert horizon whose agency has an owner to notify
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertCandidate {
    pub item_id: i64,
    pub title: String,
    pub expiration_date: NaiveDate,
    pub agency_id: i64,
    pub agency_name: String,
    pub owner_email: String,
    /// Levels already notified
    pub sent_levels: Vec<String>,
}

pub async fn alert_candidates(pool: &PgPool, horizon: NaiveDate) -> Result<Vec<AlertCandidate>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT ci.id AS item_id, ci.title, ci.expiration_date,
               a.id AS agency_id, a.name AS agency_name, u.email AS owner_email,
               ARRAY(
                   SELECT l.alert_level FROM compliance_alert_log l
                   WHERE l.compliance_item_id = ci.id
               ) AS sent_levels
        FROM compliance_items ci
        JOIN agencies a ON a.id = ci.agency_id
        JOIN users u ON u.id = a.owner_id
        WHERE ci.expiration_date IS NOT NULL
          AND ci.expiration_date <= $1
          AND a.is_active
        ORDER BY ci.expiration_date, ci.id
        "#,
    )
    .bind(horizon)
    .fetch_all(pool)
    .await
}

/// `true` when this (item, level) had not been logged yet
pub async fn record_alert(pool: &PgPool, item_id: i64, level: AlertLevel, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO compliance_alert_log (compliance_item_id, alert_level, sent_at)
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(item_id)
    .bind(level.as_db())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Forget sent alerts, e.g. after the expiration date moved
pub async fn clear_alerts(pool: &PgPool, item_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM compliance_alert_log WHERE compliance_item_id = $1")
        .bind(item_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
