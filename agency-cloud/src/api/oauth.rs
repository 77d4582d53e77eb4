//! OAuth login (authorization code + PKCE)
//!
//! GET /api/auth/oauth/authorize?next=/path → provider
//! GET /api/auth/oauth/callback?code&state → APP_BASE_URL/auth/complete#token=..&next=..

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::UserStatus;

use crate::auth::oauth::{self, STATE_TTL_MS};
use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::util::random_token;

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub next: Option<String>,
}

/// GET /api/auth/oauth/authorize
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Redirect, ServiceError> {
    let config = state.oauth.as_ref().ok_or(ErrorCode::OauthNotConfigured)?;

    let state_token = random_token(32);
    let verifier = random_token(48);
    let next = oauth::sanitize_next(query.next.as_deref());
    let expires_at = shared::util::now_millis() + STATE_TTL_MS;
    db::oauth_states::insert(&state.pool, &state_token, &verifier, &next, expires_at).await?;

    let url = oauth::authorize_url(config, &state_token, &oauth::code_challenge(&verifier))
        .map_err(|e| AppError::with_message(ErrorCode::ConfigError, format!("Invalid OAuth authorize URL: {e}")))?;
    Ok(Redirect::to(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Provider-side failure (user denied consent, ...)
    pub error: Option<String>,
}

/// What an OAuth sign-in does to an existing account
#[derive(Debug, PartialEq, Eq)]
enum OauthSignIn {
    Reject,
    /// The provider vouched for the address; any password set before
    /// verification is discarded
    Activate,
    Proceed,
}

fn sign_in_action(status: &str) -> OauthSignIn {
    match UserStatus::from_db(status) {
        Some(UserStatus::Suspended) | None => OauthSignIn::Reject,
        Some(UserStatus::Pending) => OauthSignIn::Activate,
        Some(UserStatus::Active) => OauthSignIn::Proceed,
    }
}

/// GET /api/auth/oauth/callback
///
/// Failures redirect to the login page with an error code instead of
/// returning JSON, since the browser lands here directly.
pub async fn callback(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    match complete_login(&state, query).await {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => {
            let app: AppError = e.into();
            tracing::warn!(code = %app.code, message = %app.message, "OAuth login failed");
            Redirect::to(&oauth::failure_url(&state.app_base_url, app.code.as_str())).into_response()
        }
    }
}

async fn complete_login(state: &AppState, query: CallbackQuery) -> ServiceResult<String> {
    let config = state.oauth.as_ref().ok_or(ErrorCode::OauthNotConfigured)?;
    if let Some(error) = query.error {
        return Err(AppError::with_message(ErrorCode::OauthExchangeFailed, format!("Provider error: {error}")).into());
    }
    let (Some(code), Some(state_token)) = (query.code, query.state) else {
        return Err(ErrorCode::OauthStateInvalid.into());
    };

    // Single use: consumed even when expired
    let stored = db::oauth_states::consume(&state.pool, &state_token)
        .await?
        .ok_or(ErrorCode::OauthStateInvalid)?;
    if shared::util::now_millis() > stored.expires_at {
        return Err(ErrorCode::OauthStateInvalid.into());
    }

    let info = oauth::exchange_code(&state.http, config, &code, &stored.code_verifier)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "OAuth code exchange failed");
            AppError::new(ErrorCode::OauthExchangeFailed)
        })?;

    let email_addr = info
        .email
        .as_deref()
        .map(shared::util::normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::with_message(ErrorCode::OauthExchangeFailed, "Provider returned no email"))?;
    if info.email_verified == Some(false) {
        return Err(AppError::with_message(ErrorCode::EmailNotVerified, "Provider email is not verified").into());
    }

    let now = shared::util::now_millis();
    let user = match db::users::find_by_email(&state.pool, &email_addr).await? {
        Some(user) => user,
        None => {
            let id = uuid::Uuid::new_v4().to_string();
            db::users::create(
                &state.pool,
                &db::users::NewUser {
                    id: &id,
                    email: &email_addr,
                    hashed_password: None,
                    full_name: info.name.as_deref(),
                    status: UserStatus::Active.as_db(),
                    email_verified_at: Some(now),
                },
                now,
            )
            .await?;
            tracing::info!(email = %email_addr, "User created from OAuth login");
            // Re-read: a concurrent registration may have won the insert
            db::users::find_by_email(&state.pool, &email_addr)
                .await?
                .ok_or(ErrorCode::UserNotFound)?
        }
    };

    match sign_in_action(&user.status) {
        OauthSignIn::Reject => return Err(ErrorCode::AccountDisabled.into()),
        OauthSignIn::Activate => db::users::activate_via_oauth(&state.pool, &user.id, now).await?,
        OauthSignIn::Proceed => {}
    }

    let token = crate::auth::user_auth::create_token(&user.id, &user.email, &user.role, &state.jwt_secret)
        .map_err(|e| ServiceError::Db(Box::new(e)))?;
    Ok(oauth::completion_url(&state.app_base_url, &token, &stored.next_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_action_by_status() {
        assert_eq!(sign_in_action("active"), OauthSignIn::Proceed);
        assert_eq!(sign_in_action("pending"), OauthSignIn::Activate);
        assert_eq!(sign_in_action("suspended"), OauthSignIn::Reject);
        assert_eq!(sign_in_action("unknown"), OauthSignIn::Reject);
    }
}
