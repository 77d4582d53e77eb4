//! API routes for agency-cloud

pub mod account;
pub mod admin;
pub mod agencies;
pub mod auth;
pub mod claims;
pub mod compliance;
pub mod health;
pub mod labor_requests;
pub mod links;
pub mod logo;
pub mod message_ws;
pub mod messages;
pub mod oauth;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use axum::{Router, middleware};
use serde_json::Value;
use shared::ApiResponse;
use shared::completion::{CompletionReport, profile_completion};
use shared::models::Agency;

use crate::auth::rate_limit::{
    labor_request_rate_limit, login_rate_limit, message_rate_limit, password_rate_limit, register_rate_limit,
};
use crate::auth::user_auth::{optional_auth_middleware, require_admin, user_auth_middleware};
use crate::db;
use crate::db::audit::AuditRecord;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;

/// Handler result: `{ data }` envelope or `{ error }` envelope
pub type ApiResult<T> = Result<ApiResponse<T>, ServiceError>;

/// Append an audit row; failures are logged and never fail the request
pub(crate) async fn audit(
    state: &AppState,
    actor_id: Option<&str>,
    action: &str,
    target_type: &str,
    target_id: &str,
    detail: Option<Value>,
    ip: &str,
) {
    let record = AuditRecord {
        actor_id,
        action,
        target_type,
        target_id: target_id.to_string(),
        detail,
        ip_address: Some(ip),
    };
    if let Err(e) = db::audit::log(&state.pool, &record, shared::util::now_millis()).await {
        tracing::warn!(action, target_type, target_id, error = %e, "Failed to write audit log");
    }
}

/// Completion score of an agency, counting its trade and region links
pub(crate) async fn completion_for(state: &AppState, agency: &Agency) -> ServiceResult<CompletionReport> {
    let trades = db::trades::count_for_agency(&state.pool, agency.id).await?;
    let regions = db::regions::count_for_agency(&state.pool, agency.id).await?;
    Ok(profile_completion(
        &agency.completion_input(trades as usize, regions as usize),
    ))
}

/// Multipart bodies (logo, import) need more than axum's 2MB default
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Public: auth flows (rate limited per route), reference data, directory search
    let public = Router::new()
        .route(
            "/api/auth/register",
            post(auth::register).layer(middleware::from_fn_with_state(state.clone(), register_rate_limit)),
        )
        .route(
            "/api/auth/login",
            post(auth::login).layer(middleware::from_fn_with_state(state.clone(), login_rate_limit)),
        )
        .route(
            "/api/auth/verify-email",
            post(auth::verify_email).layer(middleware::from_fn_with_state(state.clone(), password_rate_limit)),
        )
        .route(
            "/api/auth/resend-code",
            post(auth::resend_code).layer(middleware::from_fn_with_state(state.clone(), password_rate_limit)),
        )
        .route(
            "/api/auth/forgot-password",
            post(auth::forgot_password).layer(middleware::from_fn_with_state(state.clone(), password_rate_limit)),
        )
        .route(
            "/api/auth/reset-password",
            post(auth::reset_password).layer(middleware::from_fn_with_state(state.clone(), password_rate_limit)),
        )
        .route("/api/auth/oauth/authorize", get(oauth::authorize))
        .route("/api/auth/oauth/callback", get(oauth::callback))
        .route("/api/trades", get(links::list_trades))
        .route("/api/regions", get(links::list_regions))
        .route("/api/agencies", get(agencies::search))
        // JWT in the query string
        .route("/api/messages/ws", get(message_ws::handle_message_ws));

    // Optional identity: contact reveal, requester link
    let optional = Router::new()
        .route("/api/agencies/{id}", get(agencies::detail))
        .route(
            "/api/agencies/{id}/labor-requests",
            post(labor_requests::create)
                .layer(middleware::from_fn_with_state(state.clone(), labor_request_rate_limit)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), optional_auth_middleware));

    // Signed-in users; ownership is checked per handler
    let authed = Router::new()
        .route("/api/account", get(account::get_account).patch(account::update_account))
        .route("/api/account/change-password", post(account::change_password))
        .route("/api/account/agencies", get(account::my_agencies))
        .route("/api/account/claims", get(account::my_claims))
        .route("/api/agencies", post(agencies::create))
        .route("/api/agencies/{id}", patch(agencies::update).delete(agencies::delete))
        .route("/api/agencies/{id}/completion", get(agencies::completion))
        .route("/api/agencies/{id}/edits", get(agencies::edits))
        .route("/api/agencies/{id}/logo", post(logo::upload_logo))
        .route("/api/agencies/{id}/trades", put(links::sync_trades))
        .route("/api/agencies/{id}/regions", put(links::sync_regions))
        .route("/api/agencies/{id}/claim", post(claims::create_claim))
        .route("/api/claims/{id}", delete(claims::withdraw_claim))
        .route(
            "/api/agencies/{id}/compliance",
            get(compliance::list_items).post(compliance::create_item),
        )
        .route("/api/agencies/{id}/compliance/alerts", get(compliance::list_alerts))
        .route(
            "/api/agencies/{id}/compliance/{item_id}",
            patch(compliance::update_item).delete(compliance::delete_item),
        )
        .route("/api/agencies/{id}/labor-requests", get(labor_requests::list))
        .route("/api/labor-requests/{id}", patch(labor_requests::update_status))
        .route(
            "/api/conversations",
            get(messages::list_conversations).post(messages::create_conversation).layer(
                middleware::from_fn_with_state(state.clone(), message_rate_limit),
            ),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(messages::list_messages).post(messages::send_message).layer(
                middleware::from_fn_with_state(state.clone(), message_rate_limit),
            ),
        )
        .route("/api/conversations/{id}/read", post(messages::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth_middleware));

    // Admin: role checked after authentication
    let admin = Router::new()
        .route("/api/admin/stats", get(admin::get_stats))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/users/{id}", patch(admin::update_user))
        .route("/api/admin/agencies", get(admin::list_agencies))
        .route("/api/admin/agencies/{id}/moderation", patch(admin::moderate_agency))
        .route("/api/admin/claims", get(admin::list_claims))
        .route("/api/admin/claims/{id}/approve", post(admin::approve_claim))
        .route("/api/admin/claims/{id}/reject", post(admin::reject_claim))
        .route("/api/admin/compliance/{item_id}/verify", post(compliance::verify_item))
        .route("/api/admin/import", post(admin::import_agencies))
        .route("/api/admin/imports", get(admin::list_imports))
        .route("/api/admin/audit-log", get(admin::audit_log))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), user_auth_middleware));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(public)
        .merge(optional)
        .merge(authed)
        .merge(admin)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::get;
    use shared::ErrorCode;
    use tower::ServiceExt;

    use crate::auth::UserIdentity;
    use crate::auth::user_auth::create_token;

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    }

    fn error_code(body: &Value) -> Value {
        body["error"]["code"].clone()
    }

    fn code(code: ErrorCode) -> Value {
        serde_json::to_value(code).unwrap()
    }

    #[tokio::test]
    async fn test_missing_bearer_token_is_401() {
        let router = create_router(AppState::for_tests(false));
        for (method, uri) in [
            ("GET", "/api/account"),
            ("PATCH", "/api/agencies/1"),
            ("DELETE", "/api/agencies/1"),
            ("GET", "/api/agencies/1/labor-requests"),
            ("GET", "/api/admin/stats"),
        ] {
            let (status, body) = send(&router, request(method, uri)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(error_code(&body), code(ErrorCode::NotAuthenticated), "{method} {uri}");
        }
    }

    #[tokio::test]
    async fn test_bad_bearer_token_is_401() {
        let router = create_router(AppState::for_tests(false));
        let other_secret = create_token("u-1", "jane@acme.com", "admin", "some-other-secret").unwrap();
        let mut req = request("GET", "/api/admin/users");
        req.headers_mut()
            .insert(header::AUTHORIZATION, format!("Bearer {other_secret}").parse().unwrap());
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&body), code(ErrorCode::TokenInvalid));

        let mut req = request("GET", "/api/account");
        req.headers_mut()
            .insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_merged_routes_keep_their_auth() {
        let router = create_router(AppState::for_tests(false));

        // Public submission: reaches the JSON extractor without a token
        let (status, _) = send(&router, request("POST", "/api/agencies/1/labor-requests")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        // Public detail: reaches the handler, which needs the (absent) database
        let (status, body) = send(&router, request("GET", "/api/agencies/acme-staffing")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_code(&body), code(ErrorCode::InternalError));
    }

    #[tokio::test]
    async fn test_login_rate_limit_returns_429() {
        let router = create_router(AppState::for_tests(true));
        for _ in 0..5 {
            let (status, _) = send(&router, request("POST", "/api/auth/login")).await;
            assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }
        let (status, body) = send(&router, request("POST", "/api/auth/login")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error_code(&body), code(ErrorCode::RateLimited));

        // Other clients and other routes keep their own budget
        let mut req = request("POST", "/api/auth/login");
        req.headers_mut()
            .insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let (status, _) = send(&router, request("POST", "/api/agencies/1/labor-requests")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    fn admin_only(role: &str) -> Router {
        Router::new()
            .route("/admin-only", get(|| async { "ok" }))
            .layer(middleware::from_fn(require_admin))
            .layer(axum::Extension(UserIdentity {
                user_id: "u-1".into(),
                email: "jane@acme.com".into(),
                role: role.into(),
            }))
    }

    #[tokio::test]
    async fn test_require_admin() {
        let (status, body) = send(&admin_only("agency_owner"), request("GET", "/admin-only")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(error_code(&body), code(ErrorCode::AdminRequired));

        let (status, _) = send(&admin_only("admin"), request("GET", "/admin-only")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
