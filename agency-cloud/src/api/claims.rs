//! Ownership claims (claimant side)

use axum::extract::{Path, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::email_domain::email_matches_website;
use shared::error::ErrorCode;
use shared::models::{Claim, ClaimCreate};
use validator::Validate;

use crate::auth::UserIdentity;
use crate::db;
use crate::error::ServiceError;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/agencies/{id}/claim
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(agency_id): Path<i64>,
    Json(req): Json<ClaimCreate>,
) -> ApiResult<Claim> {
    req.validate()?;
    let agency = db::agencies::find_by_id(&state.pool, agency_id)
        .await?
        .ok_or(ErrorCode::AgencyNotFound)?;
    if !agency.is_active {
        return Err(ErrorCode::AgencyInactive.into());
    }
    if agency.is_claimed {
        return Err(ErrorCode::AgencyAlreadyClaimed.into());
    }
    if db::claims::has_pending(&state.pool, agency_id, &identity.user_id).await? {
        return Err(ErrorCode::ClaimAlreadyPending.into());
    }

    let business_email = shared::util::normalize_email(&req.business_email);
    let domain_verified = agency
        .website
        .as_deref()
        .is_some_and(|website| email_matches_website(&business_email, website));
    let req = ClaimCreate { business_email, ..req };

    let now = shared::util::now_millis();
    let claim = db::claims::create(&state.pool, agency_id, &identity.user_id, &req, domain_verified, now)
        .await
        .map_err(|e| {
            // One pending claim per (agency, user) is a partial unique index
            if db::is_unique_violation(&e) {
                ServiceError::from(ErrorCode::ClaimAlreadyPending)
            } else {
                e.into()
            }
        })?;

    tracing::info!(
        claim_id = claim.id,
        agency_id,
        user_id = %identity.user_id,
        domain_verified,
        "Ownership claim submitted"
    );
    Ok(ApiResponse::created(claim))
}

/// DELETE /api/claims/{id} — withdraw own pending claim
pub async fn withdraw_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let claim = db::claims::find_by_id(&state.pool, id)
        .await?
        .filter(|c| c.user_id == identity.user_id)
        .ok_or(ErrorCode::ClaimNotFound)?;
    if !claim.is_pending() {
        return Err(ErrorCode::ClaimNotPending.into());
    }

    let now = shared::util::now_millis();
    if !db::claims::withdraw(&state.pool, id, &identity.user_id, now).await? {
        // Decided between the read and the update
        return Err(ErrorCode::ClaimNotPending.into());
    }
    tracing::info!(claim_id = id, user_id = %identity.user_id, "Claim withdrawn");
    Ok(ApiResponse::success(serde_json::json!({ "withdrawn": true })))
}
