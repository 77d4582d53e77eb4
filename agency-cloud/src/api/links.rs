//! Trades and regions: reference lists and per-agency link sync

use axum::extract::{Path, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::models::{AgencyTrade, Region, RegionsSyncRequest, Trade, TradesSyncRequest};
use validator::Validate;

use crate::auth::UserIdentity;
use crate::db;
use crate::services::access::managed_agency;
use crate::services::profile_links;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/trades
pub async fn list_trades(State(state): State<AppState>) -> ApiResult<Vec<Trade>> {
    Ok(ApiResponse::success(db::trades::list_all(&state.pool).await?))
}

/// GET /api/regions
pub async fn list_regions(State(state): State<AppState>) -> ApiResult<Vec<Region>> {
    Ok(ApiResponse::success(db::regions::list_all(&state.pool).await?))
}

/// PUT /api/agencies/{id}/trades
pub async fn sync_trades(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<TradesSyncRequest>,
) -> ApiResult<Vec<AgencyTrade>> {
    req.validate()?;
    managed_agency(&state.pool, &identity, id).await?;
    let trades = profile_links::sync_trades(&state.pool, id, &identity.user_id, &req.trades).await?;
    tracing::info!(agency_id = id, count = trades.len(), "Agency trades synced");
    Ok(ApiResponse::success(trades))
}

/// PUT /api/agencies/{id}/regions
pub async fn sync_regions(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<RegionsSyncRequest>,
) -> ApiResult<Vec<Region>> {
    managed_agency(&state.pool, &identity, id).await?;
    let regions = profile_links::sync_regions(&state.pool, id, &identity.user_id, &req.normalized_ids()).await?;
    tracing::info!(agency_id = id, count = regions.len(), "Agency regions synced");
    Ok(ApiResponse::success(regions))
}
