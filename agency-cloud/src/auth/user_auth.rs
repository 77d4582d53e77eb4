//! User JWT authentication

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{UserRole, UserStatus};

use crate::db;
use crate::db::users::AccountState;
use crate::error::ServiceError;
use crate::state::AppState;

/// JWT claims for user sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// Role string at issue time
    pub role: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated user extracted from JWT
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub user_id: String,
    pub email: String,
    pub role: String,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_db()
    }
}

/// Identity on routes where authentication is optional
#[derive(Debug, Clone, Default)]
pub struct MaybeIdentity(pub Option<UserIdentity>);

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for a user
pub fn create_token(
    user_id: &str,
    email: &str,
    role: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = UserClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and return the identity it carries
pub fn verify_token(token: &str, secret: &str) -> Result<UserIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<UserClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired),
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    Ok(UserIdentity {
        user_id: token_data.claims.sub,
        email: token_data.claims.email,
        role: token_data.claims.role,
    })
}

/// Apply the account's current role and status to a token identity.
/// Suspension and role changes take effect without waiting for the token
/// to expire.
pub fn current_identity(mut identity: UserIdentity, account: Option<AccountState>) -> Result<UserIdentity, AppError> {
    let account = account.ok_or_else(|| AppError::with_message(ErrorCode::TokenInvalid, "Account no longer exists"))?;
    match UserStatus::from_db(&account.status) {
        Some(UserStatus::Active) => {}
        Some(UserStatus::Pending) => return Err(AppError::new(ErrorCode::EmailNotVerified)),
        Some(UserStatus::Suspended) | None => return Err(AppError::new(ErrorCode::AccountDisabled)),
    }
    identity.role = account.role;
    Ok(identity)
}

/// Verify the token, then check the account behind it
pub async fn authenticate(state: &AppState, token: &str) -> Result<UserIdentity, ServiceError> {
    let identity = verify_token(token, &state.jwt_secret)?;
    let account = db::users::find_account_state(&state.pool, &identity.user_id).await?;
    Ok(current_identity(identity, account)?)
}

fn bearer_token(request: &Request) -> Result<Option<&str>, AppError> {
    let Some(header) = request.headers().get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::new(ErrorCode::TokenInvalid))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AppError::with_message(ErrorCode::TokenInvalid, "Invalid Authorization format"))
}

/// Middleware that requires a valid bearer JWT
pub async fn user_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = bearer_token(&request)
        .map_err(IntoResponse::into_response)?
        .ok_or_else(|| AppError::new(ErrorCode::NotAuthenticated).into_response())?
        .to_owned();

    let identity = authenticate(&state, &token)
        .await
        .map_err(IntoResponse::into_response)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Middleware that attaches an identity when a valid token is present.
/// Missing or invalid tokens, and disabled accounts, fall through as anonymous.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(&request).ok().flatten().map(str::to_owned);
    let identity = match token {
        Some(token) => authenticate(&state, &token).await.ok(),
        None => None,
    };
    request.extensions_mut().insert(MaybeIdentity(identity));
    next.run(request).await
}

/// Layered after `user_auth_middleware`: current role must be `admin`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, Response> {
    let is_admin = request
        .extensions()
        .get::<UserIdentity>()
        .is_some_and(UserIdentity::is_admin);
    if !is_admin {
        return Err(AppError::new(ErrorCode::AdminRequired).into_response());
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_roundtrip() {
        let token = create_token("u-1", "jane@acme.com", "agency_owner", SECRET).unwrap();
        let identity = verify_token(&token, SECRET).unwrap();
        assert_eq!(identity.user_id, "u-1");
        assert_eq!(identity.email, "jane@acme.com");
        assert_eq!(identity.role, "agency_owner");
        assert!(!identity.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token("u-1", "jane@acme.com", "user", SECRET).unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_expired_token() {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = UserClaims {
            sub: "u-1".into(),
            email: "jane@acme.com".into(),
            role: "user".into(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_admin_role_check() {
        let identity = UserIdentity {
            user_id: "a".into(),
            email: "admin@site.com".into(),
            role: "admin".into(),
        };
        assert!(identity.is_admin());
    }

    fn account(role: &str, status: &str) -> Option<AccountState> {
        Some(AccountState {
            role: role.into(),
            status: status.into(),
        })
    }

    fn token_identity(role: &str) -> UserIdentity {
        UserIdentity {
            user_id: "u-1".into(),
            email: "jane@acme.com".into(),
            role: role.into(),
        }
    }

    #[test]
    fn test_current_identity_uses_stored_role() {
        let identity = current_identity(token_identity("admin"), account("user", "active")).unwrap();
        assert_eq!(identity.role, "user");
        assert!(!identity.is_admin());

        let identity = current_identity(token_identity("user"), account("agency_owner", "active")).unwrap();
        assert_eq!(identity.role, "agency_owner");
    }

    #[test]
    fn test_current_identity_rejects_suspended_and_missing() {
        let err = current_identity(token_identity("admin"), account("admin", "suspended")).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountDisabled);

        let err = current_identity(token_identity("user"), account("user", "pending")).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailNotVerified);

        let err = current_identity(token_identity("user"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }
}
