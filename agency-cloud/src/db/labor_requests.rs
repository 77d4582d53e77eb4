//! Labor requests

use shared::models::{LaborRequest, LaborRequestCreate};
use sqlx::PgPool;

pub async fn create(
    pool: &PgPool,
    agency_id: i64,
    requester_id: Option<&str>,
    data: &LaborRequestCreate,
    now: i64,
) -> Result<LaborRequest, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO labor_requests (
            agency_id, requester_id, contact_name, contact_email, contact_phone, company_name,
            trade_id, headcount, start_date, duration_weeks, location, pay_rate, description,
            status, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'new', $14, $14)
        RETURNING *
        "#,
    )
    .bind(agency_id)
    .bind(requester_id)
    .bind(data.contact_name.trim())
    .bind(shared::util::normalize_email(&data.contact_email))
    .bind(&data.contact_phone)
    .bind(&data.company_name)
    .bind(data.trade_id)
    .bind(data.headcount)
    .bind(data.start_date)
    .bind(data.duration_weeks)
    .bind(&data.location)
    .bind(data.pay_rate)
    .bind(&data.description)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<LaborRequest>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM labor_requests WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_agency(
    pool: &PgPool,
    agency_id: i64,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<LaborRequest>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM labor_requests WHERE agency_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(agency_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows: Vec<LaborRequest> = sqlx::query_as(
        "SELECT * FROM labor_requests WHERE agency_id = $1 AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
    )
    .bind(agency_id)
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn set_status(pool: &PgPool, id: i64, status: &str, now: i64) -> Result<Option<LaborRequest>, sqlx::Error> {
    sqlx::query_as("UPDATE labor_requests SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(status)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await
}
