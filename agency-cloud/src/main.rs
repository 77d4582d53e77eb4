//! agency-cloud — staffing agency directory service
//!
//! Long-running HTTP service that:
//! - Serves the public agency directory (search, profiles, trades, regions)
//! - Manages accounts (email/password + OAuth) and agency ownership claims
//! - Tracks compliance documents and emails expiry reminders
//! - Relays messages between users and agencies (REST + WebSocket)
//! - Provides admin moderation and CSV/XLSX bulk import

mod api;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod live;
mod services;
mod state;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Rate limiter cleanup period
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);
/// Expired OAuth state cleanup period
const OAUTH_STATE_CLEANUP_INTERVAL: Duration = Duration::from_secs(600);

/// UUID v4 request id
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agency_cloud=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting agency-cloud (env: {})", config.environment);

    // Initialize application state
    let state = AppState::new(&config).await?;

    let request_id = HeaderName::from_static("x-request-id");
    let app = api::create_router(state.clone()).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), XRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(cors_layer(&config.cors_origins)),
    );

    // Periodic rate limiter cleanup
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    // Expired OAuth states
    let pool = state.pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(OAUTH_STATE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match db::oauth_states::delete_expired(&pool, util::now_millis()).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(deleted = n, "Expired OAuth states removed"),
                Err(e) => tracing::warn!(error = %e, "OAuth state cleanup failed"),
            }
        }
    });

    // Compliance expiry reminders
    tokio::spawn(services::compliance_alerts::run_sweep_loop(
        state.clone(),
        Duration::from_secs(config.compliance_sweep_interval_secs),
    ));

    // Start HTTP server
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("agency-cloud HTTP listening on {http_addr}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
