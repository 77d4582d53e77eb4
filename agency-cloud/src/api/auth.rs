//! Email/password authentication: register, verify, login, password reset
//!
//! Register, resend-code and forgot-password answer with the same body whether
//! or not the address has an account.

use axum::{Json, extract::State};
use serde::Serialize;
use shared::ApiResponse;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AuthResponse, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, UserStatus,
    VerifyEmailRequest,
};
use validator::Validate;

use crate::auth::ClientIp;
use crate::db;
use crate::db::email_verifications::Purpose;
use crate::email;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::util::{CODE_TTL_MS, MAX_CODE_ATTEMPTS, generate_code, hash_password, verify_password};

use super::{ApiResult, audit};

const REGISTER_MESSAGE: &str = "Check your inbox for a verification code";
const RESEND_MESSAGE: &str = "If the account is awaiting verification, a new code has been sent";
const FORGOT_MESSAGE: &str = "If the email exists, a reset code has been sent";

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

fn message(text: &'static str) -> ApiResponse<MessageBody> {
    ApiResponse::success(MessageBody { message: text })
}

fn hash_failed(e: argon2::password_hash::Error) -> ServiceError {
    ServiceError::Db(format!("password hashing failed: {e}").into())
}

/// Issue a fresh code (replacing any previous one) and mail it
async fn issue_code(state: &AppState, email_addr: &str, purpose: Purpose) -> ServiceResult<()> {
    let code = generate_code();
    let code_hash = hash_password(&code).map_err(hash_failed)?;
    let now = shared::util::now_millis();
    db::email_verifications::upsert(&state.pool, email_addr, purpose, &code_hash, now + CODE_TTL_MS, now).await?;

    let (mail, kind) = match purpose {
        Purpose::VerifyEmail => (email::verification_code(&code), "verification_code"),
        Purpose::ResetPassword => (email::password_reset_code(&code), "password_reset"),
    };
    state.email.send_detached(email_addr.to_string(), mail, kind);
    Ok(())
}

/// Check a submitted code; the record is consumed on success
async fn consume_code(state: &AppState, email_addr: &str, purpose: Purpose, code: &str) -> ServiceResult<()> {
    let record = db::email_verifications::find(&state.pool, email_addr, purpose)
        .await?
        .ok_or(ErrorCode::VerificationCodeInvalid)?;

    let now = shared::util::now_millis();
    if now > record.expires_at {
        db::email_verifications::delete(&state.pool, email_addr, purpose).await?;
        return Err(ErrorCode::VerificationCodeExpired.into());
    }
    if record.attempts >= MAX_CODE_ATTEMPTS {
        return Err(ErrorCode::TooManyAttempts.into());
    }
    if !verify_password(code.trim(), &record.code) {
        db::email_verifications::increment_attempts(&state.pool, email_addr, purpose).await?;
        let remaining = MAX_CODE_ATTEMPTS - record.attempts - 1;
        return Err(AppError::new(ErrorCode::VerificationCodeInvalid)
            .with_detail("attempts_remaining", remaining.max(0))
            .into());
    }

    db::email_verifications::delete(&state.pool, email_addr, purpose).await?;
    Ok(())
}

fn session_token(state: &AppState, user_id: &str, email_addr: &str, role: &str) -> ServiceResult<String> {
    crate::auth::user_auth::create_token(user_id, email_addr, role, &state.jwt_secret)
        .map_err(|e| ServiceError::Db(Box::new(e)))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<MessageBody> {
    req.validate()?;
    let email_addr = shared::util::normalize_email(&req.email);

    if db::users::find_by_email(&state.pool, &email_addr).await?.is_some() {
        tracing::debug!("Registration for existing email ignored");
        return Ok(message(REGISTER_MESSAGE));
    }

    let user_id = uuid::Uuid::new_v4().to_string();
    let hashed = hash_password(&req.password).map_err(hash_failed)?;
    let now = shared::util::now_millis();
    let created = db::users::create(
        &state.pool,
        &db::users::NewUser {
            id: &user_id,
            email: &email_addr,
            hashed_password: Some(&hashed),
            full_name: Some(req.full_name.trim()),
            status: UserStatus::Pending.as_db(),
            email_verified_at: None,
        },
        now,
    )
    .await?;

    if created {
        issue_code(&state, &email_addr, Purpose::VerifyEmail).await?;
        tracing::info!(user_id = %user_id, "User registered, verification pending");
    }
    Ok(message(REGISTER_MESSAGE))
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<AuthResponse> {
    req.validate()?;
    let email_addr = shared::util::normalize_email(&req.email);

    consume_code(&state, &email_addr, Purpose::VerifyEmail, &req.code).await?;

    let user = db::users::find_by_email(&state.pool, &email_addr)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    if UserStatus::from_db(&user.status) == Some(UserStatus::Suspended) {
        return Err(ErrorCode::AccountDisabled.into());
    }

    let now = shared::util::now_millis();
    db::users::activate(&state.pool, &user.id, now).await?;
    let profile = db::users::find_profile(&state.pool, &user.id)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;

    let token = session_token(&state, &profile.id, &profile.email, &profile.role)?;
    tracing::info!(user_id = %profile.id, "Email verified");
    Ok(ApiResponse::success(AuthResponse { token, user: profile }))
}

/// POST /api/auth/resend-code
pub async fn resend_code(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<MessageBody> {
    req.validate()?;
    let email_addr = shared::util::normalize_email(&req.email);

    if let Some(user) = db::users::find_by_email(&state.pool, &email_addr).await?
        && UserStatus::from_db(&user.status) == Some(UserStatus::Pending)
    {
        issue_code(&state, &email_addr, Purpose::VerifyEmail).await?;
    }
    Ok(message(RESEND_MESSAGE))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email_addr = shared::util::normalize_email(&req.email);
    let user = db::users::find_by_email(&state.pool, &email_addr)
        .await?
        .ok_or(ErrorCode::InvalidCredentials)?;

    // OAuth-only accounts have no password
    let Some(hash) = user.hashed_password.as_deref() else {
        return Err(ErrorCode::InvalidCredentials.into());
    };
    if !verify_password(&req.password, hash) {
        return Err(ErrorCode::InvalidCredentials.into());
    }

    match UserStatus::from_db(&user.status) {
        Some(UserStatus::Active) => {}
        Some(UserStatus::Pending) => return Err(ErrorCode::EmailNotVerified.into()),
        _ => return Err(ErrorCode::AccountDisabled.into()),
    }

    let token = session_token(&state, &user.id, &user.email, &user.role)?;
    audit(&state, Some(&user.id), "login", "user", &user.id, None, &ip).await;

    Ok(ApiResponse::success(AuthResponse {
        token,
        user: user.into_profile(),
    }))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<MessageBody> {
    req.validate()?;
    let email_addr = shared::util::normalize_email(&req.email);

    if let Some(user) = db::users::find_by_email(&state.pool, &email_addr).await?
        && UserStatus::from_db(&user.status) != Some(UserStatus::Suspended)
    {
        issue_code(&state, &email_addr, Purpose::ResetPassword).await?;
    }
    Ok(message(FORGOT_MESSAGE))
}

/// POST /api/auth/reset-password
///
/// A reset also verifies the address, so pending accounts become active.
pub async fn reset_password(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<MessageBody> {
    req.validate()?;
    let email_addr = shared::util::normalize_email(&req.email);

    consume_code(&state, &email_addr, Purpose::ResetPassword, &req.code).await?;

    let user = db::users::find_by_email(&state.pool, &email_addr)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    let hashed = hash_password(&req.new_password).map_err(hash_failed)?;
    let now = shared::util::now_millis();
    db::users::update_password(&state.pool, &user.id, &hashed, now).await?;
    if UserStatus::from_db(&user.status) == Some(UserStatus::Pending) {
        db::users::activate(&state.pool, &user.id, now).await?;
    }

    audit(&state, Some(&user.id), "password_reset", "user", &user.id, None, &ip).await;
    tracing::info!(user_id = %user.id, "Password reset");
    Ok(message("Password has been reset"))
}
