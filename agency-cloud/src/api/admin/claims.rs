//! Claim review
//!
//! Approving a claim hands the agency to the claimant and rejects every other
//! pending claim on it, all in one transaction. Emails go out after commit.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::error::ErrorCode;
use shared::models::{ClaimListItem, ClaimQuery, ClaimReject, Page, Pagination};
use validator::Validate;

use crate::api::{ApiResult, audit};
use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::email::{self, Email};
use crate::state::AppState;

/// Reason recorded on claims that lose to an approved one
const COMPETING_REJECTION_REASON: &str = "Another ownership claim for this agency was approved";

/// Look up the account email and send in the background
async fn notify_user(state: &AppState, user_id: &str, message: Email, kind: &'static str) {
    match db::users::find_by_id(&state.pool, user_id).await {
        Ok(Some(user)) => state.email.send_detached(user.email, message, kind),
        Ok(None) => tracing::warn!(user_id, kind, "Claimant no longer exists, skipping email"),
        Err(e) => tracing::warn!(user_id, kind, error = %e, "Failed to load claimant for email"),
    }
}

/// GET /api/admin/claims?status=
pub async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<ClaimQuery>,
) -> ApiResult<Page<ClaimListItem>> {
    let pagination = Pagination {
        page: query.page,
        per_page: query.per_page,
    };
    let (limit, offset) = pagination.limit_offset();
    let status = query.status.map(|s| s.as_db());
    let (items, total) = db::claims::list(&state.pool, status, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}

/// POST /api/admin/claims/{id}/approve
pub async fn approve_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let claim = db::claims::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::ClaimNotFound)?;
    if !claim.is_pending() {
        return Err(ErrorCode::ClaimNotPending.into());
    }
    let agency = db::agencies::find_by_id(&state.pool, claim.agency_id)
        .await?
        .ok_or(ErrorCode::AgencyNotFound)?;

    let now = shared::util::now_millis();
    let mut tx = state.pool.begin().await?;
    if !db::claims::mark_approved(&mut *tx, id, &identity.user_id, now).await? {
        return Err(ErrorCode::ClaimNotPending.into());
    }
    if !db::agencies::assign_owner(&mut *tx, agency.id, &claim.user_id, now).await? {
        return Err(ErrorCode::AgencyAlreadyClaimed.into());
    }
    db::users::promote_to_owner(&mut *tx, &claim.user_id, now).await?;
    let rejected = db::claims::reject_competing(
        &mut *tx,
        agency.id,
        id,
        &identity.user_id,
        COMPETING_REJECTION_REASON,
        now,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        claim_id = id,
        agency_id = agency.id,
        user_id = %claim.user_id,
        competing_rejected = rejected.len(),
        "Claim approved"
    );

    notify_user(
        &state,
        &claim.user_id,
        email::claim_approved(state.email.app_base_url(), &agency.name, &agency.slug),
        "claim_approved",
    )
    .await;
    for user_id in &rejected {
        notify_user(
            &state,
            user_id,
            email::claim_rejected(&agency.name, COMPETING_REJECTION_REASON),
            "claim_rejected",
        )
        .await;
    }

    audit(
        &state,
        Some(&identity.user_id),
        "claim_approved",
        "claim",
        &id.to_string(),
        Some(serde_json::json!({
            "agency_id": agency.id,
            "user_id": claim.user_id,
            "competing_rejected": rejected.len(),
        })),
        &ip,
    )
    .await;
    Ok(ApiResponse::success(serde_json::json!({
        "approved": true,
        "competing_rejected": rejected.len(),
    })))
}

/// POST /api/admin/claims/{id}/reject
pub async fn reject_claim(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    Json(req): Json<ClaimReject>,
) -> ApiResult<serde_json::Value> {
    req.validate()?;
    let reason = req.reason.trim();
    let claim = db::claims::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::ClaimNotFound)?;
    if !claim.is_pending() {
        return Err(ErrorCode::ClaimNotPending.into());
    }

    let now = shared::util::now_millis();
    if !db::claims::mark_rejected(&state.pool, id, &identity.user_id, reason, now).await? {
        return Err(ErrorCode::ClaimNotPending.into());
    }
    tracing::info!(claim_id = id, agency_id = claim.agency_id, "Claim rejected");

    match db::agencies::find_by_id(&state.pool, claim.agency_id).await {
        Ok(Some(agency)) => {
            notify_user(
                &state,
                &claim.user_id,
                email::claim_rejected(&agency.name, reason),
                "claim_rejected",
            )
            .await
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(claim_id = id, error = %e, "Failed to load agency for rejection email"),
    }

    audit(
        &state,
        Some(&identity.user_id),
        "claim_rejected",
        "claim",
        &id.to_string(),
        Some(serde_json::json!({ "agency_id": claim.agency_id, "reason": reason })),
        &ip,
    )
    .await;
    Ok(ApiResponse::success(serde_json::json!({ "rejected": true })))
}
