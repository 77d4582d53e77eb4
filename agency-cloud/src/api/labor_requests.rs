//! Labor requests: public submission, agency-side triage

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    LaborRequest, LaborRequestCreate, LaborRequestQuery, LaborRequestStatusUpdate, Page, Pagination,
};
use validator::Validate;

use crate::auth::{MaybeIdentity, UserIdentity};
use crate::db;
use crate::email;
use crate::services::access::managed_agency;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/agencies/{id}/labor-requests
///
/// Anonymous submissions are accepted; a signed-in requester is linked.
pub async fn create(
    State(state): State<AppState>,
    Extension(MaybeIdentity(identity)): Extension<MaybeIdentity>,
    Path(agency_id): Path<i64>,
    Json(req): Json<LaborRequestCreate>,
) -> ApiResult<LaborRequest> {
    req.validate()?;
    if !req.pay_rate_valid() {
        return Err(AppError::with_message(ErrorCode::ValueOutOfRange, "Invalid pay rate")
            .with_detail("field", "pay_rate")
            .into());
    }
    let agency = db::agencies::find_by_id(&state.pool, agency_id)
        .await?
        .filter(|a| a.is_active)
        .ok_or(ErrorCode::AgencyNotFound)?;
    if let Some(trade_id) = req.trade_id
        && db::trades::existing_ids(&state.pool, &[trade_id]).await?.is_empty()
    {
        return Err(ErrorCode::TradeNotFound.into());
    }

    let requester = identity.as_ref().map(|i| i.user_id.as_str());
    let now = shared::util::now_millis();
    let request = db::labor_requests::create(&state.pool, agency_id, requester, &req, now).await?;
    tracing::info!(request_id = request.id, agency_id, headcount = request.headcount, "Labor request submitted");

    if let Some(owner_id) = agency.owner_id.as_deref() {
        match db::users::find_by_id(&state.pool, owner_id).await {
            Ok(Some(owner)) => state.email.send_detached(
                owner.email,
                email::labor_request_received(
                    state.email.app_base_url(),
                    &agency.name,
                    agency.id,
                    request.headcount,
                ),
                "labor_request_received",
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!(agency_id, error = %e, "Failed to load agency owner for notification"),
        }
    }

    Ok(ApiResponse::created(request))
}

/// GET /api/agencies/{id}/labor-requests?status=
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(agency_id): Path<i64>,
    Query(query): Query<LaborRequestQuery>,
) -> ApiResult<Page<LaborRequest>> {
    managed_agency(&state.pool, &identity, agency_id).await?;
    let pagination = Pagination {
        page: query.page,
        per_page: query.per_page,
    };
    let (limit, offset) = pagination.limit_offset();
    let status = query.status.map(|s| s.as_db());
    let (items, total) = db::labor_requests::list_for_agency(&state.pool, agency_id, status, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}

/// PATCH /api/labor-requests/{id}
pub async fn update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<LaborRequestStatusUpdate>,
) -> ApiResult<LaborRequest> {
    let request = db::labor_requests::find_by_id(&state.pool, id)
        .await?
        .ok_or(ErrorCode::LaborRequestNotFound)?;
    managed_agency(&state.pool, &identity, request.agency_id).await?;

    let now = shared::util::now_millis();
    let updated = db::labor_requests::set_status(&state.pool, id, req.status.as_db(), now)
        .await?
        .ok_or(ErrorCode::LaborRequestNotFound)?;
    tracing::info!(request_id = id, status = req.status.as_db(), "Labor request status updated");
    Ok(ApiResponse::success(updated))
}
