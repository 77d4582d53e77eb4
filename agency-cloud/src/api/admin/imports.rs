//! Bulk agency import

use axum::extract::{Multipart, Query, State};
use axum::Extension;
use shared::ApiResponse;
use shared::models::{ImportQuery, ImportRecord, ImportReport, Page, Pagination};

use crate::api::logo::read_file_field;
use crate::api::{ApiResult, audit};
use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::services::import;
use crate::state::AppState;

/// POST /api/admin/import?dry_run=true|false (multipart `file`)
pub async fn import_agencies(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> ApiResult<ImportReport> {
    let (file_name, bytes) = read_file_field(&mut multipart).await?;
    let report = import::run_import(&state.pool, &identity.user_id, &file_name, &bytes, query.dry_run).await?;

    if !query.dry_run {
        audit(
            &state,
            Some(&identity.user_id),
            "agencies_imported",
            "import",
            &file_name,
            Some(serde_json::json!({
                "total_rows": report.total_rows,
                "created": report.created,
                "updated": report.updated,
                "skipped": report.skipped,
                "errors": report.errors.len(),
            })),
            &ip,
        )
        .await;
    }
    Ok(ApiResponse::success(report))
}

/// GET /api/admin/imports
pub async fn list_imports(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Page<ImportRecord>> {
    let (limit, offset) = pagination.limit_offset();
    let (items, total) = db::imports::list(&state.pool, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}
