//! Admin dashboard counters

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AdminStats {
    pub users_total: i64,
    pub users_pending: i64,
    pub agencies_total: i64,
    pub agencies_claimed: i64,
    pub agencies_verified: i64,
    pub claims_pending: i64,
    pub compliance_expiring: i64,
    pub compliance_expired: i64,
    pub labor_requests_open: i64,
}

/// `horizon` is the last day counted as expiring soon
pub async fn load(pool: &PgPool, today: NaiveDate, horizon: NaiveDate) -> Result<AdminStats, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS users_total,
            (SELECT COUNT(*) FROM users WHERE status = 'pending') AS users_pending,
            (SELECT COUNT(*) FROM agencies) AS agencies_total,
            (SELECT COUNT(*) FROM agencies WHERE is_claimed) AS agencies_claimed,
            (SELECT COUNT(*) FROM agencies WHERE is_verified) AS agencies_verified,
            (SELECT COUNT(*) FROM agency_claims WHERE status = 'pending') AS claims_pending,
            (SELECT COUNT(*) FROM compliance_items
             WHERE expiration_date >= $1 AND expiration_date <= $2) AS compliance_expiring,
            (SELECT COUNT(*) FROM compliance_items WHERE expiration_date < $1) AS compliance_expired,
            (SELECT COUNT(*) FROM labor_requests WHERE status IN ('new', 'reviewed')) AS labor_requests_open
        "#,
    )
    .bind(today)
    .bind(horizon)
    .fetch_one(pool)
    .await
}
