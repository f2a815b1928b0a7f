use std::{
    net::SocketAddr,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::debug;

use crate::{
    error::AppError,
    state::{SharedState, rate_limit::RateDecision},
};

pub mod admin;
pub mod docs;
pub mod extract;
pub mod health;
pub mod mine_game;
pub mod quiz;
pub mod teams;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
/// Sent outside development only.
const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Compose all route trees, wiring in shared state, rate limiting, security
/// headers and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(teams::router())
        .merge(quiz::router())
        .merge(mine_game::router())
        .merge(admin::router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let hsts = (!state.config().development).then(|| HeaderValue::from_static(HSTS));

    api_router
        .merge(docs::router())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PERMISSIONS_POLICY,
            HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            hsts,
        ))
        .with_state(state)
}

/// Caller address used as rate limiting key: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    };

    header_value("x-forwarded-for")
        .or_else(|| header_value("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_owned())
}

fn unix_secs(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

fn set_rate_headers(response: &mut Response, limit: u32, remaining: u32, reset_at: SystemTime) {
    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(unix_secs(reset_at)));
}

async fn rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(req.headers(), peer);

    match state.rate_limiter().check(&key) {
        RateDecision::Allowed {
            limit,
            remaining,
            reset_at,
        } => {
            let mut response = next.run(req).await;
            set_rate_headers(&mut response, limit, remaining, reset_at);
            response
        }
        RateDecision::Limited {
            limit,
            retry_after,
            reset_at,
        } => {
            debug!(client = %key, "rate limit exceeded");
            let retry_after_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            let mut response = AppError::TooManyRequests { retry_after_secs }.into_response();
            set_rate_headers(&mut response, limit, 0, reset_at);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_key_prefers_forwarded_headers() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:4000".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "10.0.0.9");
        assert_eq!(client_key(&headers, None), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.2"));
        assert_eq!(client_key(&headers, Some(peer)), "192.168.1.2");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
    }
}
