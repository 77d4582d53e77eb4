//! Compliance items of an agency (owner/admin)

use axum::extract::{Path, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::error::ErrorCode;
use shared::models::{ComplianceItemCreate, ComplianceItemUpdate, ComplianceItemView, compliance_alerts};
use validator::Validate;

use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::services::access::managed_agency;
use crate::state::AppState;

use super::{ApiResult, audit};

/// GET /api/agencies/{id}/compliance
pub async fn list_items(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(agency_id): Path<i64>,
) -> ApiResult<Vec<ComplianceItemView>> {
    managed_agency(&state.pool, &identity, agency_id).await?;
    let today = shared::util::today();
    let items = db::compliance::list_for_agency(&state.pool, agency_id)
        .await?
        .into_iter()
        .map(|item| ComplianceItemView::new(item, today))
        .collect();
    Ok(ApiResponse::success(items))
}

/// GET /api/agencies/{id}/compliance/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(agency_id): Path<i64>,
) -> ApiResult<Vec<ComplianceItemView>> {
    managed_agency(&state.pool, &identity, agency_id).await?;
    let items = db::compliance::list_for_agency(&state.pool, agency_id).await?;
    Ok(ApiResponse::success(compliance_alerts(items, shared::util::today())))
}

/// POST /api/agencies/{id}/compliance
pub async fn create_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(agency_id): Path<i64>,
    Json(req): Json<ComplianceItemCreate>,
) -> ApiResult<ComplianceItemView> {
    req.validate()?;
    if !req.dates_valid() {
        return Err(ErrorCode::ComplianceDatesInvalid.into());
    }
    managed_agency(&state.pool, &identity, agency_id).await?;

    let item = db::compliance::create(&state.pool, agency_id, &req, shared::util::now_millis()).await?;
    tracing::info!(agency_id, item_id = item.id, "Compliance item created");
    Ok(ApiResponse::created(ComplianceItemView::new(item, shared::util::today())))
}

/// PATCH /api/agencies/{id}/compliance/{item_id}
///
/// Changing dates or the certificate number drops the admin verification and
/// re-arms expiry reminders.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((agency_id, item_id)): Path<(i64, i64)>,
    Json(req): Json<ComplianceItemUpdate>,
) -> ApiResult<ComplianceItemView> {
    req.validate()?;
    managed_agency(&state.pool, &identity, agency_id).await?;
    let current = db::compliance::find(&state.pool, agency_id, item_id)
        .await?
        .ok_or(ErrorCode::ComplianceItemNotFound)?;
    if !req.dates_valid(&current) {
        return Err(ErrorCode::ComplianceDatesInvalid.into());
    }

    let clear_verification = req.clears_verification(&current);
    let now = shared::util::now_millis();
    let item = db::compliance::update(&state.pool, item_id, &req, clear_verification, now)
        .await?
        .ok_or(ErrorCode::ComplianceItemNotFound)?;

    if item.expiration_date != current.expiration_date {
        if let Err(e) = db::compliance::clear_alerts(&state.pool, item_id).await {
            tracing::warn!(item_id, error = %e, "Failed to reset compliance alerts (non-critical)");
        }
    }

    tracing::info!(agency_id, item_id, clear_verification, "Compliance item updated");
    Ok(ApiResponse::success(ComplianceItemView::new(item, shared::util::today())))
}

/// DELETE /api/agencies/{id}/compliance/{item_id}
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path((agency_id, item_id)): Path<(i64, i64)>,
) -> ApiResult<serde_json::Value> {
    managed_agency(&state.pool, &identity, agency_id).await?;
    if !db::compliance::delete(&state.pool, agency_id, item_id).await? {
        return Err(ErrorCode::ComplianceItemNotFound.into());
    }
    tracing::info!(agency_id, item_id, "Compliance item deleted");
    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

/// POST /api/admin/compliance/{item_id}/verify
pub async fn verify_item(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(item_id): Path<i64>,
) -> ApiResult<ComplianceItemView> {
    let now = shared::util::now_millis();
    let item = db::compliance::verify(&state.pool, item_id, &identity.user_id, now)
        .await?
        .ok_or(ErrorCode::ComplianceItemNotFound)?;

    audit(
        &state,
        Some(&identity.user_id),
        "compliance_verified",
        "compliance_item",
        &item_id.to_string(),
        Some(serde_json::json!({ "agency_id": item.agency_id })),
        &ip,
    )
    .await;
    Ok(ApiResponse::success(ComplianceItemView::new(item, shared::util::today())))
}
