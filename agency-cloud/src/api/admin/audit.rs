//! Audit log viewer

use axum::extract::{Query, State};
use shared::ApiResponse;
use shared::models::{Page, Pagination};

use crate::db;
use crate::db::audit::AuditEntry;
use crate::state::AppState;

use crate::api::ApiResult;

/// GET /api/admin/audit-log?page=&per_page=
pub async fn audit_log(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Page<AuditEntry>> {
    let (limit, offset) = pagination.limit_offset();
    let (items, total) = db::audit::query(&state.pool, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}
