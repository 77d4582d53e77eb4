//! Service regions and agency region links

use shared::models::Region;
use sqlx::PgPool;

pub async fn list_all(pool: &PgPool) -> Result<Vec<Region>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, slug, state_code FROM regions ORDER BY state_code NULLS LAST, name")
        .fetch_all(pool)
        .await
}

pub async fn existing_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM regions WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn list_for_agency(pool: &PgPool, agency_id: i64) -> Result<Vec<Region>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT r.id, r.name, r.slug, r.state_code
        FROM agency_regions ar
        JOIN regions r ON r.id = ar.region_id
        WHERE ar.agency_id = $1
        ORDER BY r.name
        "#,
    )
    .bind(agency_id)
    .fetch_all(pool)
    .await
}

pub async fn agency_region_ids(pool: &PgPool, agency_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT region_id FROM agency_regions WHERE agency_id = $1 ORDER BY region_id")
        .bind(agency_id)
        .fetch_all(pool)
        .await
}

pub async fn count_for_agency(pool: &PgPool, agency_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM agency_regions WHERE agency_id = $1")
        .bind(agency_id)
        .fetch_one(pool)
        .await
}

pub async fn insert_missing<'e, E>(executor: E, agency_id: i64, region_ids: &[i64]) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    if region_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        "INSERT INTO agency_regions (agency_id, region_id)
         SELECT $1, UNNEST($2::bigint[])
         ON CONFLICT (agency_id, region_id) DO NOTHING",
    )
    .bind(agency_id)
    .bind(region_ids)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_orphans<'e, E>(executor: E, agency_id: i64, keep: &[i64]) -> Result<u64, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM agency_regions WHERE agency_id = $1 AND NOT (region_id = ANY($2))")
        .bind(agency_id)
        .bind(keep)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
