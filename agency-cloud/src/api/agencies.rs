//! Agency profile CRUD and public directory

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::completion::CompletionReport;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Agency, AgencyCreate, AgencyDetail, AgencySearchQuery, AgencySummary, AgencyUpdate, ComplianceItemView, Page,
    Pagination, ProfileEdit, UserRole,
};
use validator::Validate;

use crate::auth::{ClientIp, MaybeIdentity, UserIdentity};
use crate::db;
use crate::error::ServiceError;
use crate::services::access::{can_manage, managed_agency};
use crate::state::AppState;

use super::{ApiResult, audit, completion_for};

/// GET /api/agencies
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<AgencySearchQuery>,
) -> ApiResult<Page<AgencySummary>> {
    let pagination = Pagination {
        page: query.page,
        per_page: query.per_page,
    };
    let (limit, offset) = pagination.limit_offset();
    let (items, total) = db::agencies::search(&state.pool, &query, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}

#[derive(Debug, PartialEq)]
enum AgencyKey<'a> {
    Slug(&'a str),
    Id(i64),
}

/// Slug first; numeric keys fall back to the id
fn lookup_order(key: &str) -> Vec<AgencyKey<'_>> {
    let mut order = vec![AgencyKey::Slug(key)];
    if let Ok(id) = key.parse::<i64>() {
        order.push(AgencyKey::Id(id));
    }
    order
}

/// GET /api/agencies/{id}
///
/// Accepts the slug or the numeric id; the slug wins when both match. Anonymous viewers of an unclaimed
/// agency get masked contact details; inactive agencies are only visible to
/// whoever manages them.
pub async fn detail(
    State(state): State<AppState>,
    Extension(MaybeIdentity(identity)): Extension<MaybeIdentity>,
    Path(key): Path<String>,
) -> ApiResult<AgencyDetail> {
    let mut found = None;
    for lookup in lookup_order(&key) {
        found = match lookup {
            AgencyKey::Slug(slug) => db::agencies::find_by_slug(&state.pool, slug).await?,
            AgencyKey::Id(id) => db::agencies::find_by_id(&state.pool, id).await?,
        };
        if found.is_some() {
            break;
        }
    }
    let agency = found.ok_or(ErrorCode::AgencyNotFound)?;

    let manager = identity.as_ref().is_some_and(|id| can_manage(&agency, id));
    if !agency.is_active && !manager {
        return Err(ErrorCode::AgencyNotFound.into());
    }

    let trades = db::trades::list_for_agency(&state.pool, agency.id).await?;
    let regions = db::regions::list_for_agency(&state.pool, agency.id).await?;
    let today = shared::util::today();
    let compliance: Vec<ComplianceItemView> = db::compliance::list_public(&state.pool, agency.id, today)
        .await?
        .into_iter()
        .map(|item| ComplianceItemView::new(item, today))
        .collect();
    let completion = shared::completion::profile_completion(&agency.completion_input(trades.len(), regions.len()));

    let reveal = identity.is_some() || agency.is_claimed;
    Ok(ApiResponse::success(AgencyDetail {
        agency: agency.present_contact(reveal),
        trades,
        regions,
        compliance,
        completion,
    }))
}

/// POST /api/agencies
///
/// The caller becomes owner; a plain `user` is promoted to `agency_owner`.
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Json(req): Json<AgencyCreate>,
) -> ApiResult<Agency> {
    req.validate()?;
    let slug = db::agencies::unique_slug(&state.pool, &req.name).await?;
    let now = shared::util::now_millis();

    let mut tx = state.pool.begin().await?;
    let agency = db::agencies::create(&mut *tx, &req, &slug, Some(&identity.user_id), now)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ServiceError::App(AppError::new(ErrorCode::AgencySlugExists).with_detail("slug", slug.clone()))
            } else {
                e.into()
            }
        })?;
    if UserRole::from_db(&identity.role) == Some(UserRole::User) {
        db::users::promote_to_owner(&mut *tx, &identity.user_id, now).await?;
    }
    tx.commit().await?;

    tracing::info!(agency_id = agency.id, slug = %agency.slug, user_id = %identity.user_id, "Agency created");
    audit(
        &state,
        Some(&identity.user_id),
        "agency_created",
        "agency",
        &agency.id.to_string(),
        Some(serde_json::json!({ "slug": agency.slug })),
        &ip,
    )
    .await;
    Ok(ApiResponse::created(agency))
}

/// PATCH /api/agencies/{id}
///
/// Writes one `agency_profile_edits` row per changed field, in the same
/// transaction as the update.
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<AgencyUpdate>,
) -> ApiResult<Agency> {
    req.validate()?;
    let agency = managed_agency(&state.pool, &identity, id).await?;

    let changes = req.changes(&agency);
    if changes.is_empty() {
        return Ok(ApiResponse::success(agency));
    }

    let now = shared::util::now_millis();
    let mut tx = state.pool.begin().await?;
    let updated = db::agencies::update(&mut *tx, id, &req, now)
        .await?
        .ok_or(ErrorCode::AgencyNotFound)?;
    db::profile_edits::insert_changes(&mut *tx, id, Some(&identity.user_id), &changes, now).await?;
    tx.commit().await?;

    tracing::info!(agency_id = id, fields = changes.len(), "Agency profile updated");
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/agencies/{id}
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let agency = managed_agency(&state.pool, &identity, id).await?;
    if !db::agencies::delete(&state.pool, id).await? {
        return Err(ErrorCode::AgencyNotFound.into());
    }

    tracing::info!(agency_id = id, user_id = %identity.user_id, "Agency deleted");
    audit(
        &state,
        Some(&identity.user_id),
        "agency_deleted",
        "agency",
        &id.to_string(),
        Some(serde_json::json!({ "slug": agency.slug, "name": agency.name })),
        &ip,
    )
    .await;
    Ok(ApiResponse::success(serde_json::json!({ "deleted": true })))
}

/// GET /api/agencies/{id}/completion
pub async fn completion(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<CompletionReport> {
    let agency = managed_agency(&state.pool, &identity, id).await?;
    Ok(ApiResponse::success(completion_for(&state, &agency).await?))
}

/// GET /api/agencies/{id}/edits
pub async fn edits(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(id): Path<i64>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Page<ProfileEdit>> {
    managed_agency(&state.pool, &identity, id).await?;
    let (limit, offset) = pagination.limit_offset();
    let (items, total) = db::profile_edits::list(&state.pool, id, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_order_prefers_slug() {
        assert_eq!(lookup_order("acme-staffing"), vec![AgencyKey::Slug("acme-staffing")]);
        assert_eq!(lookup_order("911"), vec![AgencyKey::Slug("911"), AgencyKey::Id(911)]);
    }
}
