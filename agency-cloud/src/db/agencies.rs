//! Agency profiles

use shared::models::{Agency, AgencyCreate, AgencySearchQuery, AgencySummary, AgencyUpdate, ModerationUpdate};
use sqlx::PgPool;

use super::patch_value;

/// Fallback when a name has no slug-able characters
const DEFAULT_SLUG: &str = "agency";

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Agency>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agencies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Agency>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agencies WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

/// First free slug among `base`, `base-2`, `base-3`, ...
pub fn next_available_slug(base: &str, taken: &[String]) -> String {
    let base = if base.is_empty() { DEFAULT_SLUG } else { base };
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.iter().any(|s| s == candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Unique slug derived from `name`
pub async fn unique_slug(pool: &PgPool, name: &str) -> Result<String, sqlx::Error> {
    let base = shared::util::slugify(name);
    let base = if base.is_empty() { DEFAULT_SLUG.to_string() } else { base };
    let taken: Vec<String> =
        sqlx::query_scalar("SELECT slug FROM agencies WHERE slug = $1 OR slug LIKE $1 || '-%'")
            .bind(&base)
            .fetch_all(pool)
            .await?;
    Ok(next_available_slug(&base, &taken))
}

pub async fn create<'e, E>(
    executor: E,
    data: &AgencyCreate,
    slug: &str,
    owner_id: Option<&str>,
    now: i64,
) -> Result<Agency, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as(
        r#"
        INSERT INTO agencies (
            slug, name, description, website, email, phone, address_line, city, state,
            postal_code, founded_year, employee_count, is_union, offers_per_diem,
            is_claimed, owner_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)
        RETURNING *
        "#,
    )
    .bind(slug)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(&data.website)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(&data.address_line)
    .bind(&data.city)
    .bind(&data.state)
    .bind(&data.postal_code)
    .bind(data.founded_year)
    .bind(&data.employee_count)
    .bind(data.is_union.unwrap_or(false))
    .bind(data.offers_per_diem.unwrap_or(false))
    .bind(owner_id.is_some())
    .bind(owner_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Partial update; absent fields keep their value, `null` clears
pub async fn update<'e, E>(
    executor: E,
    id: i64,
    data: &AgencyUpdate,
    now: i64,
) -> Result<Option<Agency>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    update_where(executor, id, data, now, false).await
}

/// Same as `update` but leaves claimed agencies alone (`None` when claimed)
pub async fn update_unclaimed<'e, E>(
    executor: E,
    id: i64,
    data: &AgencyUpdate,
    now: i64,
) -> Result<Option<Agency>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    update_where(executor, id, data, now, true).await
}

async fn update_where<'e, E>(
    executor: E,
    id: i64,
    data: &AgencyUpdate,
    now: i64,
    only_unclaimed: bool,
) -> Result<Option<Agency>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let (description_set, description) = patch_value(&data.description);
    let (website_set, website) = patch_value(&data.website);
    let (email_set, email) = patch_value(&data.email);
    let (phone_set, phone) = patch_value(&data.phone);
    let (address_set, address_line) = patch_value(&data.address_line);
    let (city_set, city) = patch_value(&data.city);
    let (state_set, state) = patch_value(&data.state);
    let (postal_set, postal_code) = patch_value(&data.postal_code);
    let (year_set, founded_year) = patch_value(&data.founded_year);
    let (employees_set, employee_count) = patch_value(&data.employee_count);

    sqlx::query_as(
        r#"
        UPDATE agencies SET
            name = COALESCE($1, name),
            description = CASE WHEN $2 THEN $3 ELSE description END,
            website = CASE WHEN $4 THEN $5 ELSE website END,
            email = CASE WHEN $6 THEN $7 ELSE email END,
            phone = CASE WHEN $8 THEN $9 ELSE phone END,
            address_line = CASE WHEN $10 THEN $11 ELSE address_line END,
            city = CASE WHEN $12 THEN $13 ELSE city END,
            state = CASE WHEN $14 THEN $15 ELSE state END,
            postal_code = CASE WHEN $16 THEN $17 ELSE postal_code END,
            founded_year = CASE WHEN $18 THEN $19 ELSE founded_year END,
            employee_count = CASE WHEN $20 THEN $21 ELSE employee_count END,
            is_union = COALESCE($22, is_union),
            offers_per_diem = COALESCE($23, offers_per_diem),
            updated_at = $24
        WHERE id = $25 AND (NOT $26 OR NOT is_claimed)
        RETURNING *
        "#,
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(description_set)
    .bind(description)
    .bind(website_set)
    .bind(website)
    .bind(email_set)
    .bind(email)
    .bind(phone_set)
    .bind(phone)
    .bind(address_set)
    .bind(address_line)
    .bind(city_set)
    .bind(city)
    .bind(state_set)
    .bind(state)
    .bind(postal_set)
    .bind(postal_code)
    .bind(year_set)
    .bind(founded_year)
    .bind(employees_set)
    .bind(employee_count)
    .bind(data.is_union)
    .bind(data.offers_per_diem)
    .bind(now)
    .bind(id)
    .bind(only_unclaimed)
    .fetch_optional(executor)
    .await
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM agencies WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_logo(pool: &PgPool, id: i64, logo_url: &str, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE agencies SET logo_url = $1, updated_at = $2 WHERE id = $3")
        .bind(logo_url)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Assign an owner to an unclaimed agency; `false` if it was claimed meanwhile
pub async fn assign_owner<'e, E>(executor: E, id: i64, owner_id: &str, now: i64) -> Result<bool, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE agencies SET owner_id = $1, is_claimed = TRUE, updated_at = $2
         WHERE id = $3 AND NOT is_claimed",
    )
    .bind(owner_id)
    .bind(now)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

// ── Directory ──

const SUMMARY_SELECT: &str = r#"
    SELECT a.id, a.slug, a.name, a.city, a.state, a.logo_url,
           a.is_union, a.is_claimed, a.is_verified, a.is_featured,
           ARRAY(
               SELECT t.name FROM agency_trades at
               JOIN trades t ON t.id = at.trade_id
               WHERE at.agency_id = a.id
               ORDER BY at.is_primary DESC, t.name
           ) AS trades
    FROM agencies a
"#;

const SEARCH_FILTER: &str = r#"
    WHERE a.is_active
      AND ($1::text IS NULL OR a.name ILIKE $1)
      AND ($2::text IS NULL OR EXISTS (
            SELECT 1 FROM agency_trades at JOIN trades t ON t.id = at.trade_id
            WHERE at.agency_id = a.id AND t.slug = $2))
      AND ($3::text IS NULL OR EXISTS (
            SELECT 1 FROM agency_regions ar JOIN regions r ON r.id = ar.region_id
            WHERE ar.agency_id = a.id AND r.slug = $3))
      AND ($4::text IS NULL OR UPPER(a.state) = UPPER($4))
      AND ($5::bool IS NULL OR a.is_union = $5)
      AND ($6::bool IS NULL OR a.is_verified = $6)
"#;

/// Public search over active agencies: featured first, then by name
pub async fn search(
    pool: &PgPool,
    query: &AgencySearchQuery,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AgencySummary>, i64), sqlx::Error> {
    let pattern = super::like_pattern(query.q.as_deref());
    let trade = shared::util::non_blank(query.trade.as_deref());
    let region = shared::util::non_blank(query.region.as_deref());
    let state = shared::util::non_blank(query.state.as_deref());

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM agencies a {SEARCH_FILTER}"))
        .bind(&pattern)
        .bind(trade)
        .bind(region)
        .bind(state)
        .bind(query.union)
        .bind(query.verified)
        .fetch_one(pool)
        .await?;

    let rows: Vec<AgencySummary> = sqlx::query_as(&format!(
        "{SUMMARY_SELECT} {SEARCH_FILTER} ORDER BY a.is_featured DESC, a.name ASC, a.id ASC LIMIT $7 OFFSET $8"
    ))
    .bind(&pattern)
    .bind(trade)
    .bind(region)
    .bind(state)
    .bind(query.union)
    .bind(query.verified)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn list_owned(pool: &PgPool, owner_id: &str) -> Result<Vec<Agency>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agencies WHERE owner_id = $1 ORDER BY name")
        .bind(owner_id)
        .fetch_all(pool)
        .await
}

// ── Admin ──

pub async fn admin_list(
    pool: &PgPool,
    pattern: Option<&str>,
    active: Option<bool>,
    claimed: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Agency>, i64), sqlx::Error> {
    const FILTER: &str = "($1::text IS NULL OR name ILIKE $1 OR slug ILIKE $1)
         AND ($2::bool IS NULL OR is_active = $2)
         AND ($3::bool IS NULL OR is_claimed = $3)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM agencies WHERE {FILTER}"))
        .bind(pattern)
        .bind(active)
        .bind(claimed)
        .fetch_one(pool)
        .await?;

    let rows: Vec<Agency> = sqlx::query_as(&format!(
        "SELECT * FROM agencies WHERE {FILTER} ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
    ))
    .bind(pattern)
    .bind(active)
    .bind(claimed)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn moderate(
    pool: &PgPool,
    id: i64,
    data: &ModerationUpdate,
    now: i64,
) -> Result<Option<Agency>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE agencies SET
            is_verified = COALESCE($1, is_verified),
            is_featured = COALESCE($2, is_featured),
            is_active = COALESCE($3, is_active),
            updated_at = $4
         WHERE id = $5
         RETURNING *",
    )
    .bind(data.is_verified)
    .bind(data.is_featured)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_available_slug() {
        assert_eq!(next_available_slug("acme", &[]), "acme");
        assert_eq!(next_available_slug("acme", &["acme".into()]), "acme-2");
        assert_eq!(
            next_available_slug("acme", &["acme".into(), "acme-2".into(), "acme-staffing".into()]),
            "acme-3"
        );
        assert_eq!(next_available_slug("", &[]), "agency");
    }
}
