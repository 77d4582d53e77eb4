//! Dashboard counters

use axum::extract::State;
use shared::ApiResponse;
use shared::compliance::EXPIRING_SOON_DAYS;

use crate::db;
use crate::db::stats::AdminStats;
use crate::state::AppState;

use crate::api::ApiResult;

/// GET /api/admin/stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<AdminStats> {
    let today = shared::util::today();
    let horizon = today
        .checked_add_days(chrono::Days::new(EXPIRING_SOON_DAYS as u64))
        .unwrap_or(today);
    Ok(ApiResponse::success(db::stats::load(&state.pool, today, horizon).await?))
}
