//! User administration

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::ApiResponse;
use shared::error::ErrorCode;
use shared::models::{AdminUserQuery, AdminUserUpdate, Page, Pagination, UserProfile, UserRole, UserStatus};

use crate::api::{ApiResult, audit};
use crate::auth::{ClientIp, UserIdentity};
use crate::db;
use crate::state::AppState;

/// GET /api/admin/users?q=&role=&page=
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<AdminUserQuery>,
) -> ApiResult<Page<UserProfile>> {
    let pagination = Pagination {
        page: query.page,
        per_page: query.per_page,
    };
    let (limit, offset) = pagination.limit_offset();
    let pattern = db::like_pattern(query.q.as_deref());
    let role = query.role.map(|r| r.as_db());
    let (items, total) = db::users::list(&state.pool, pattern.as_deref(), role, limit, offset).await?;
    Ok(ApiResponse::success(Page::new(items, total, &pagination)))
}

/// An admin may not take away their own admin role or access
fn is_self_demotion(identity: &UserIdentity, target_id: &str, req: &AdminUserUpdate) -> bool {
    identity.user_id == target_id
        && (req.role.is_some_and(|r| r != UserRole::Admin)
            || req.status.is_some_and(|s| s != UserStatus::Active))
}

/// PATCH /api/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ClientIp(ip): ClientIp,
    Path(id): Path<String>,
    Json(req): Json<AdminUserUpdate>,
) -> ApiResult<UserProfile> {
    if is_self_demotion(&identity, &id, &req) {
        return Err(ErrorCode::CannotModifySelf.into());
    }

    let now = shared::util::now_millis();
    let role = req.role.map(|r| r.as_db());
    let status = req.status.map(|s| s.as_db());
    let user = db::users::set_role_status(&state.pool, &id, role, status, now)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;

    tracing::info!(user_id = %id, admin_id = %identity.user_id, ?role, ?status, "User updated by admin");
    audit(
        &state,
        Some(&identity.user_id),
        "user_updated",
        "user",
        &id,
        Some(serde_json::json!({ "role": role, "status": status })),
        &ip,
    )
    .await;
    Ok(ApiResponse::success(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> UserIdentity {
        UserIdentity {
            user_id: "admin-1".into(),
            email: "admin@site.com".into(),
            role: "admin".into(),
        }
    }

    fn update(role: Option<UserRole>, status: Option<UserStatus>) -> AdminUserUpdate {
        AdminUserUpdate { role, status }
    }

    #[test]
    fn test_self_demotion_blocked() {
        let me = admin();
        assert!(is_self_demotion(&me, "admin-1", &update(Some(UserRole::User), None)));
        assert!(is_self_demotion(&me, "admin-1", &update(None, Some(UserStatus::Suspended))));
    }

    #[test]
    fn test_noop_self_update_and_other_users_allowed() {
        let me = admin();
        assert!(!is_self_demotion(&me, "admin-1", &update(Some(UserRole::Admin), Some(UserStatus::Active))));
        assert!(!is_self_demotion(&me, "user-2", &update(Some(UserRole::User), Some(UserStatus::Suspended))));
    }
}
