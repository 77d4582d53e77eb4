//! Agency moderation

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::error::{AppError, ErrorCode};
use shared::models::{AdminAgencyQuery, Agency, ModerationUpdate, Page, Pagination};

use crate::api::{ApiResult, audit};
use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::state::AppState;

/// GET /api/admin/agencies?q=&active=&claimed=&page=
pub async fn list_agencies(
    State(state): State<AppState>,
    Query(query): Query<AdminAgencyQuery>,
) -> ApiResult<Page<Agency>> {
    let pagination = Pagination {
        page: query.page,
        per_page: query.per_page,
    };
    let (limit, offset) = pagination.limit_offset();
    let pattern = db::like_pattern(query.q.as_deref());
    let (items, total) = db::agencies::admin_list(
        &state.pool,
        pattern.as_deref(),
        query.active,
        query.claimed,
        limit,
        offset,
    )
    .await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}

/// PATCH /api/admin/agencies/{id}/moderation
pub async fn moderate_agency(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
    Json(req): Json<ModerationUpdate>,
) -> ApiResult<Agency> {
    if req.is_empty() {
        return Err(AppError::with_message(ErrorCode::InvalidRequest, "No moderation flags given").into());
    }

    let now = shared::util::now_millis();
    let agency = db::agencies::moderate(&state.pool, id, &req, now)
        .await?
        .ok_or(ErrorCode::AgencyNotFound)?;

    tracing::info!(agency_id = id, admin_id = %identity.user_id, ?req, "Agency moderated");
    audit(
        &state,
        Some(&identity.user_id),
        "agency_moderated",
        "agency",
        &id.to_string(),
        serde_json::to_value(&req).ok(),
        &ip,
    )
    .await;
    Ok(ApiResponse::success(agency))
}
