//! User accounts

use shared::models::UserProfile;
use sqlx::PgPool;

#[derive(Debug, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub hashed_password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub email_verified_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            phone: self.phone,
            role: self.role,
            status: self.status,
            email_verified_at: self.email_verified_at,
            created_at: self.created_at,
        }
    }
}

const PROFILE_COLUMNS: &str =
    "id, email, full_name, phone, role, status, email_verified_at, created_at";

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub hashed_password: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub status: &'a str,
    pub email_verified_at: Option<i64>,
}

/// Insert a user; returns `false` when the email is already taken
pub async fn create(pool: &PgPool, user: &NewUser<'_>, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (id, email, hashed_password, full_name, role, status, email_verified_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, 'user', $5, $6, $7, $7)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(user.id)
    .bind(user.email)
    .bind(user.hashed_password)
    .bind(user.full_name)
    .bind(user.status)
    .bind(user.email_verified_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Current role and status, checked on every authenticated request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountState {
    pub role: String,
    pub status: String,
}

pub async fn find_account_state(pool: &PgPool, id: &str) -> Result<Option<AccountState>, sqlx::Error> {
    sqlx::query_as("SELECT role, status FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_profile(pool: &PgPool, id: &str) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Pending → active after email verification
pub async fn activate(pool: &PgPool, id: &str, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET status = 'active', email_verified_at = COALESCE(email_verified_at, $1), updated_at = $1
         WHERE id = $2 AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Pending → active through an OAuth provider
///
/// The password chosen at the unverified registration is dropped: whoever set
/// it never proved ownership of the address.
pub async fn activate_via_oauth(pool: &PgPool, id: &str, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET status = 'active', hashed_password = NULL,
             email_verified_at = COALESCE(email_verified_at, $1), updated_at = $1
         WHERE id = $2 AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_password(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3")
        .bind(hashed_password)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_profile(
    pool: &PgPool,
    id: &str,
    full_name: Option<&str>,
    phone: Option<&str>,
    now: i64,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE users SET full_name = COALESCE($1, full_name), phone = COALESCE($2, phone), updated_at = $3
         WHERE id = $4 RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(full_name)
    .bind(phone)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// `user` → `agency_owner`; other roles are left alone
pub async fn promote_to_owner<'e, E>(executor: E, id: &str, now: i64) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query("UPDATE users SET role = 'agency_owner', updated_at = $1 WHERE id = $2 AND role = 'user'")
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

// ── Admin ──

pub async fn list(
    pool: &PgPool,
    pattern: Option<&str>,
    role: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserProfile>, i64), sqlx::Error> {
    const FILTER: &str = "($1::text IS NULL OR email ILIKE $1 OR full_name ILIKE $1)
         AND ($2::text IS NULL OR role = $2)";

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {FILTER}"))
        .bind(pattern)
        .bind(role)
        .fetch_one(pool)
        .await?;

    let rows: Vec<UserProfile> = sqlx::query_as(&format!(
        "SELECT {PROFILE_COLUMNS} FROM users WHERE {FILTER}
         ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(pattern)
    .bind(role)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn set_role_status(
    pool: &PgPool,
    id: &str,
    role: Option<&str>,
    status: Option<&str>,
    now: i64,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(&format!(
        "UPDATE users SET role = COALESCE($1, role), status = COALESCE($2, status), updated_at = $3
         WHERE id = $4 RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(role)
    .bind(status)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}
