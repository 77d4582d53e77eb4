//! Application-layer rate limiting (sliding window per route and client IP)
//!
//! Each key keeps the hit count of the current fixed window and of the one
//! before it. The estimate weights the previous count by how much of it still
//! overlaps the sliding window ending now.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Route budget
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub route: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

const MINUTE: Duration = Duration::from_secs(60);

pub const LOGIN: Policy = Policy {
    route: "login",
    max_requests: 5,
    window: MINUTE,
};
pub const REGISTER: Policy = Policy {
    route: "register",
    max_requests: 3,
    window: MINUTE,
};
pub const PASSWORD: Policy = Policy {
    route: "password",
    max_requests: 3,
    window: MINUTE,
};
pub const LABOR_REQUEST: Policy = Policy {
    route: "labor_request",
    max_requests: 10,
    window: MINUTE,
};
pub const MESSAGE_SEND: Policy = Policy {
    route: "message_send",
    max_requests: 30,
    window: MINUTE,
};

/// Idle time after which an entry is dropped by `cleanup`
const ENTRY_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct SlidingWindow {
    window_start: Instant,
    current: u32,
    previous: u32,
}

impl SlidingWindow {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            current: 0,
            previous: 0,
        }
    }

    /// Records the hit and returns `true` when it fits the budget.
    /// Rejected hits are not counted.
    fn hit(&mut self, now: Instant, max_requests: u32, window: Duration) -> bool {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed >= window * 2 {
            self.previous = 0;
            self.current = 0;
            self.window_start = now;
        } else if elapsed >= window {
            self.previous = self.current;
            self.current = 0;
            self.window_start += window;
        }

        let into_window = now.saturating_duration_since(self.window_start).as_secs_f64();
        let overlap = 1.0 - (into_window / window.as_secs_f64()).min(1.0);
        let estimate = f64::from(self.previous) * overlap + f64::from(self.current);

        if estimate + 1.0 > f64::from(max_requests) {
            return false;
        }
        self.current += 1;
        true
    }

    fn idle_since(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    /// route name -> (IP -> window)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, SlidingWindow>>>>,
}

impl RateLimiter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, policy: Policy, ip: &str) -> bool {
        self.check_at(policy, ip, Instant::now()).await
    }

    async fn check_at(&self, policy: Policy, ip: &str, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        let mut map = self.inner.lock().await;
        map.entry(policy.route)
            .or_default()
            .entry(ip.to_owned())
            .or_insert_with(|| SlidingWindow::new(now))
            .hit(now, policy.max_requests, policy.window)
    }

    /// Remove entries idle for longer than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| entry.idle_since(now) < ENTRY_TTL);
        }

        // Remove empty route maps
        map.retain(|_, route_map| !route_map.is_empty());
    }
}

/// Extract client IP: X-Forwarded-For header first (load balancer), then peer address.
pub fn extract_ip(request: &Request) -> String {
    client_ip(
        request.headers(),
        request
            .extensions()
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|ci| ci.0),
    )
}

pub fn client_ip(headers: &http::HeaderMap, peer: Option<std::net::SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
    {
        // First entry is the original client
        if let Some(first) = val.split(',').next() {
            let ip = first.trim();
            if !ip.is_empty() {
                return ip.to_owned();
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Client IP as a handler extractor (audit rows)
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut http::request::Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
            .map(|ci| ci.0);
        Ok(ClientIp(client_ip(&parts.headers, peer)))
    }
}

async fn enforce(
    state: &AppState,
    policy: Policy,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(policy, &ip).await {
        tracing::warn!(route = policy.route, ip = %ip, "Rate limit exceeded");
        return Err(AppError::new(ErrorCode::RateLimited).into_response());
    }
    Ok(next.run(request).await)
}

/// Login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, LOGIN, request, next).await
}

/// Registration: 3 requests/minute per IP
pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, REGISTER, request, next).await
}

/// Forgot/reset password and resend code: 3 requests/minute per IP
pub async fn password_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, PASSWORD, request, next).await
}

/// Public labor-request submission: 10 requests/minute per IP
pub async fn labor_request_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, LABOR_REQUEST, request, next).await
}

/// Message sending: 30 requests/minute per IP
pub async fn message_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, MESSAGE_SEND, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let t0 = Instant::now();
        let mut w = SlidingWindow::new(t0);
        for _ in 0..5 {
            assert!(w.hit(t0, 5, WINDOW));
        }
        assert!(!w.hit(t0, 5, WINDOW));
        assert_eq!(w.current, 5);
    }

    #[test]
    fn test_previous_window_is_weighted() {
        let t0 = Instant::now();
        let mut w = SlidingWindow::new(t0);
        for _ in 0..10 {
            assert!(w.hit(t0, 10, WINDOW));
        }

        // Halfway into the next window, half of the previous 10 still counts
        let t1 = t0 + WINDOW + Duration::from_secs(30);
        let allowed = (0..10).filter(|_| w.hit(t1, 10, WINDOW)).count();
        assert_eq!(allowed, 5);
        assert_eq!(w.previous, 10);
    }

    #[test]
    fn test_long_idle_resets() {
        let t0 = Instant::now();
        let mut w = SlidingWindow::new(t0);
        for _ in 0..3 {
            w.hit(t0, 3, WINDOW);
        }
        assert!(!w.hit(t0, 3, WINDOW));

        let later = t0 + WINDOW * 3;
        assert!(w.hit(later, 3, WINDOW));
        assert_eq!(w.previous, 0);
        assert_eq!(w.current, 1);
    }

    #[tokio::test]
    async fn test_disabled_limiter_is_noop() {
        let limiter = RateLimiter::new(false);
        for _ in 0..100 {
            assert!(limiter.check(REGISTER, "1.2.3.4").await);
        }
    }

    #[tokio::test]
    async fn test_keys_are_per_route_and_ip() {
        let limiter = RateLimiter::new(true);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(REGISTER, "1.1.1.1", now).await);
        }
        assert!(!limiter.check_at(REGISTER, "1.1.1.1", now).await);
        assert!(limiter.check_at(REGISTER, "2.2.2.2", now).await);
        assert!(limiter.check_at(LOGIN, "1.1.1.1", now).await);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = http::HeaderMap::new();
        let peer: std::net::SocketAddr = "10.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.1");
        assert_eq!(client_ip(&headers, None), "unknown");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.2".parse().unwrap());
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
    }
}
