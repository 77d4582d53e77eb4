//! Caller's own account

use axum::{Extension, Json, extract::State};
use shared::ApiResponse;
use shared::error::ErrorCode;
use shared::models::{AccountUpdate, ChangePasswordRequest, ClaimListItem, OwnedAgency, UserProfile};
use validator::Validate;

use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

use super::{ApiResult, audit, completion_for};

/// GET /api/account
pub async fn get_account(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<UserProfile> {
    let profile = db::users::find_profile(&state.pool, &identity.user_id)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    Ok(ApiResponse::success(profile))
}

/// PATCH /api/account
pub async fn update_account(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<AccountUpdate>,
) -> ApiResult<UserProfile> {
    req.validate()?;
    let now = shared::util::now_millis();
    let profile = db::users::update_profile(
        &state.pool,
        &identity.user_id,
        req.full_name.as_deref().map(str::trim),
        req.phone.as_deref().map(str::trim),
        now,
    )
    .await?
    .ok_or(ErrorCode::UserNotFound)?;
    Ok(ApiResponse::success(profile))
}

/// POST /api/account/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<serde_json::Value> {
    req.validate()?;
    let user = db::users::find_by_id(&state.pool, &identity.user_id)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;

    let current_ok = user
        .hashed_password
        .as_deref()
        .is_some_and(|hash| verify_password(&req.current_password, hash));
    if !current_ok {
        return Err(ErrorCode::InvalidCredentials.into());
    }

    let hashed = hash_password(&req.new_password)
        .map_err(|e| ServiceError::Db(format!("password hashing failed: {e}").into()))?;
    db::users::update_password(&state.pool, &user.id, &hashed, shared::util::now_millis()).await?;
    audit(&state, Some(&user.id), "password_changed", "user", &user.id, None, &ip).await;

    Ok(ApiResponse::success(serde_json::json!({ "message": "Password changed" })))
}

/// GET /api/account/agencies
pub async fn my_agencies(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<OwnedAgency>> {
    let agencies = db::agencies::list_owned(&state.pool, &identity.user_id).await?;
    let mut out = Vec::with_capacity(agencies.len());
    for agency in agencies {
        let completion = completion_for(&state, &agency).await?;
        out.push(OwnedAgency { agency, completion });
    }
    Ok(ApiResponse::success(out))
}

/// GET /api/account/claims
pub async fn my_claims(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<ClaimListItem>> {
    let claims = db::claims::list_for_user(&state.pool, &identity.user_id).await?;
    Ok(ApiResponse::success(claims))
}
