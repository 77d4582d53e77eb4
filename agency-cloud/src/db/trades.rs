//! Trades reference data and agency trade links

use shared::models::{AgencyTrade, Trade, TradeSelection};
use sqlx::PgPool;

pub async fn list_all(pool: &PgPool) -> Result<Vec<Trade>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, slug, category FROM trades ORDER BY category NULLS LAST, name")
        .fetch_all(pool)
        .await
}

/// Subset of `ids` that exist
pub async fn existing_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM trades WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn list_for_agency(pool: &PgPool, agency_id: i64) -> Result<Vec<AgencyTrade>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT t.id AS trade_id, t.name, t.slug, t.category, at.is_primary, at.years_experience
        FROM agency_trades at
        JOIN trades t ON t.id = at.trade_id
        WHERE at.agency_id = $1
        ORDER BY at.is_primary DESC, t.name
        "#,
    )
    .bind(agency_id)
    .fetch_all(pool)
    .await
}

/// Linked trade ids, ascending
pub async fn agency_trade_ids(pool: &PgPool, agency_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT trade_id FROM agency_trades WHERE agency_id = $1 ORDER BY trade_id")
        .bind(agency_id)
        .fetch_all(pool)
        .await
}

pub async fn count_for_agency(pool: &PgPool, agency_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM agency_trades WHERE agency_id = $1")
        .bind(agency_id)
        .fetch_one(pool)
        .await
}

/// Insert or update every submitted link in one statement
pub async fn upsert<'e, E>(executor: E, agency_id: i64, selections: &[TradeSelection]) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    if selections.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = selections.iter().map(|s| s.trade_id).collect();
    let primary: Vec<bool> = selections.iter().map(|s| s.is_primary).collect();
    let years: Vec<Option<i32>> = selections.iter().map(|s| s.years_experience).collect();

    sqlx::query(
        r#"
        INSERT INTO agency_trades (agency_id, trade_id, is_primary, years_experience)
        SELECT $1, u.trade_id, u.is_primary, u.years_experience
        FROM UNNEST($2::bigint[], $3::bool[], $4::int[]) AS u(trade_id, is_primary, years_experience)
        ON CONFLICT (agency_id, trade_id) DO UPDATE SET
            is_primary = EXCLUDED.is_primary,
            years_experience = EXCLUDED.years_experience
        "#,
    )
    .bind(agency_id)
    .bind(&ids)
    .bind(&primary)
    .bind(&years)
    .execute(executor)
    .await?;
    Ok(())
}

/// Remove links not in `keep`; returns the number removed
pub async fn delete_orphans<'e, E>(executor: E, agency_id: i64, keep: &[i64]) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM agency_trades WHERE agency_id = $1 AND NOT (trade_id = ANY($2))")
        .bind(agency_id)
        .bind(keep)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
