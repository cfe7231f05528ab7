// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use crate::metrics;
use crate::ratelimit::{Decision, Identity, RateLimitPolicy, RateLimiter};
use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the id of the user authenticated upstream.
pub const USER_ID_HEADER: &str = "x-user-id";

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Create request ID layers for the application
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeRequestUuid),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// Policies enforced in front of one group of routes.
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: Arc<RateLimiter>,
    policies: Arc<[RateLimitPolicy]>,
    trust_proxy_headers: bool,
}

impl RateLimitGuard {
    pub fn new(
        limiter: Arc<RateLimiter>,
        policies: Vec<RateLimitPolicy>,
        trust_proxy_headers: bool,
    ) -> Self {
        Self {
            limiter,
            policies: policies.into(),
            trust_proxy_headers,
        }
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
}

/// Client address used for `ip` identities.
///
/// With `trust_proxy_headers` the first `X-Forwarded-For` hop, then
/// `X-Real-IP`, is used when it parses as an address. Otherwise the socket
/// peer, or `unknown` when there is none.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(ip) = header_ip(headers, "x-forwarded-for").or_else(|| header_ip(headers, "x-real-ip")) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Authenticated user id, if the request carries one.
pub fn user_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

/// Count the request against every policy of the guard, in order.
///
/// The first rejection short-circuits with 429. Admitted responses carry the
/// quota headers of the tightest counted policy.
pub async fn enforce_rate_limit(
    State(guard): State<RateLimitGuard>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer, guard.trust_proxy_headers);
    let user = user_id(request.headers()).map(str::to_string);

    let mut tightest: Option<Decision> = None;
    for policy in guard.policies.iter() {
        let identity = Identity::resolve(policy.identity, user.as_deref(), &ip);
        let decision = guard.limiter.admit(policy, &identity).await;

        if !decision.allowed {
            return rejection(policy, &decision);
        }
        if decision.degraded {
            continue;
        }
        if tightest
            .as_ref()
            .map_or(true, |t| decision.remaining <= t.remaining)
        {
            tightest = Some(decision);
        }
    }

    let mut response = next.run(request).await;
    if let Some(decision) = tightest {
        quota_headers(response.headers_mut(), &decision);
    }
    response
}

fn quota_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(decision.limit));
    headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(decision.remaining));
    if let Ok(reset) = HeaderValue::from_str(&decision.reset_at().to_rfc3339()) {
        headers.insert(RATELIMIT_RESET.clone(), reset);
    }
}

fn rejection(policy: &RateLimitPolicy, decision: &Decision) -> Response {
    let retry_after = decision.retry_after_secs().unwrap_or(0);
    let body = json!({
        "error": policy.message,
        "retryAfter": retry_after,
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    quota_headers(headers, decision);
    headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

/// Record request count and latency per matched route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    metrics::record_request(
        &method,
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
