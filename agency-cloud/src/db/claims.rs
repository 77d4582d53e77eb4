//! Agency ownership claims

use shared::models::{Claim, ClaimCreate, ClaimListItem};
use sqlx::PgPool;

const LIST_SELECT: &str = r#"
    SELECT c.*, a.name AS agency_name, a.slug AS agency_slug, u.email AS user_email
    FROM agency_claims c
    JOIN agencies a ON a.id = c.agency_id
    JOIN users u ON u.id = c.user_id
"#;

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Claim>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agency_claims WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn has_pending(pool: &PgPool, agency_id: i64, user_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM agency_claims WHERE agency_id = $1 AND user_id = $2 AND status = 'pending')",
    )
    .bind(agency_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    agency_id: i64,
    user_id: &str,
    data: &ClaimCreate,
    email_domain_verified: bool,
    now: i64,
) -> Result<Claim, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO agency_claims (
            agency_id, user_id, status, business_email, position_title, notes,
            email_domain_verified, created_at, updated_at
        )
        VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7, $7)
        RETURNING *
        "#,
    )
    .bind(agency_id)
    .bind(user_id)
    .bind(shared::util::normalize_email(&data.business_email))
    .bind(&data.position_title)
    .bind(&data.notes)
    .bind(email_domain_verified)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list_for_user(pool: &PgPool, user_id: &str) -> Result<Vec<ClaimListItem>, sqlx::Error> {
    sqlx::query_as(&format!("{LIST_SELECT} WHERE c.user_id = $1 ORDER BY c.created_at DESC"))
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ClaimListItem>, i64), sqlx::Error> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM agency_claims WHERE ($1::text IS NULL OR status = $1)")
            .bind(status)
            .fetch_one(pool)
            .await?;

    let rows: Vec<ClaimListItem> = sqlx::query_as(&format!(
        "{LIST_SELECT} WHERE ($1::text IS NULL OR c.status = $1)
         ORDER BY c.created_at ASC, c.id ASC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Claimant withdraws their own pending claim
pub async fn withdraw(pool: &PgPool, id: i64, user_id: &str, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE agency_claims SET status = 'withdrawn', updated_at = $1
         WHERE id = $2 AND user_id = $3 AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Pending → approved; `false` if no longer pending
pub async fn mark_approved<'e, E>(executor: E, id: i64, reviewer_id: &str, now: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE agency_claims SET status = 'approved', reviewed_by = $1, reviewed_at = $2, updated_at = $2
         WHERE id = $3 AND status = 'pending'",
    )
    .bind(reviewer_id)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Reject every other pending claim on the agency; returns the affected claimant ids
pub async fn reject_competing<'e, E>(
    executor: E,
    agency_id: i64,
    approved_id: i64,
    reviewer_id: &str,
    reason: &str,
    now: i64,
) -> Result<Vec<String>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar(
        "UPDATE agency_claims SET status = 'rejected', rejection_reason = $1,
             reviewed_by = $2, reviewed_at = $3, updated_at = $3
         WHERE agency_id = $4 AND id <> $5 AND status = 'pending'
         RETURNING user_id",
    )
    .bind(reason)
    .bind(reviewer_id)
    .bind(now)
    .bind(agency_id)
    .bind(approved_id)
    .fetch_all(executor)
    .await
}

/// Pending → rejected; `false` if no longer pending
pub async fn mark_rejected(
    pool: &PgPool,
    id: i64,
    reviewer_id: &str,
    reason: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE agency_claims SET status = 'rejected', rejection_reason = $1,
             reviewed_by = $2, reviewed_at = $3, updated_at = $3
         WHERE id = $4 AND status = 'pending'",
    )
    .bind(reason)
    .bind(reviewer_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
