//! Health check endpoint

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

impl HealthStatus {
    fn new(database_ok: bool) -> Self {
        Self {
            status: if database_ok { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: if database_ok { "ok" } else { "unavailable" },
        }
    }
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let database_ok = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            false
        }
    };
    Json(HealthStatus::new(database_ok))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_payload() {
        let json = serde_json::to_value(HealthStatus::new(true)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));

        let json = serde_json::to_value(HealthStatus::new(false)).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["database"], "unavailable");
    }
}
