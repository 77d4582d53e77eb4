//! Single-use OAuth state + PKCE verifier storage

use sqlx::PgPool;

#[derive(sqlx::FromRow)]
pub struct OAuthState {
    pub state: String,
    pub code_verifier: String,
    pub next_path: String,
    pub expires_at: i64,
}

pub async fn insert(
    pool: &PgPool,
    state: &str,
    code_verifier: &str,
    next_path: &str,
    expires_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO oauth_states (state, code_verifier, next_path, expires_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(state)
    .bind(code_verifier)
    .bind(next_path)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete and return the state; a second call for the same state yields `None`
pub async fn consume(pool: &PgPool, state: &str) -> Result<Option<OAuthState>, sqlx::Error> {
    sqlx::query_as("DELETE FROM oauth_states WHERE state = $1 RETURNING *")
        .bind(state)
        .fetch_optional(pool)
        .await
}

pub async fn delete_expired(pool: &PgPool, now: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at < $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
