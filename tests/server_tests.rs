// HTTP surface tests driven through the router
// Author: kelexine (https://github.com/kelexine)

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use textlens::cache::{DerivedCache, ListCache};
use textlens::config::{AppConfig, PolicyConfig};
use textlens::documents::{DocumentService, InMemoryDocumentRepository};
use textlens::ratelimit::{IdentityMode, RateLimiter};
use textlens::server::create_router;
use textlens::store::{KeyValueStore, MemoryStore};
use tower::ServiceExt;

fn app_with(config: AppConfig) -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
    let cache = Arc::new(DerivedCache::new(shared.clone(), config.cache.clone()));
    let lists = ListCache::new(shared.clone(), 3600, true);
    let documents = Arc::new(DocumentService::new(
        Arc::new(InMemoryDocumentRepository::new()),
        cache,
        lists,
    ));
    let limiter = Arc::new(RateLimiter::new(shared, config.rate_limit.enabled));
    (create_router(config, documents, limiter).unwrap(), store)
}

fn app() -> (Router, MemoryStore) {
    app_with(AppConfig::default())
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.10");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create(app: &Router, user: &str, content: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/texts",
            Some(user),
            Some(json!({ "title": "Sample", "content": content })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["text"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let (app, store) = app();

    let response = app.clone().oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("ratelimit-limit"));
    assert_eq!(json_body(response).await["status"], "healthy");

    store.set_available(false);
    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Fail-open admission carries no quota headers
    assert!(!response.headers().contains_key("ratelimit-limit"));
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["cache"]["connected"], false);
}

#[tokio::test]
async fn test_missing_user_is_unauthorized() {
    let (app, _) = app();
    let response = app.oneshot(request("GET", "/api/texts", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_crud_and_analysis() {
    let (app, _) = app();
    let id = create(
        &app,
        "alice",
        "The quick brown fox jumps over the lazy dog. The lazy dog slept in the sun.",
    )
    .await;

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/texts/{}/words", id), Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["wordCount"], 16);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/texts/{}/analysis", id), Some("alice"), None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["textId"], id.as_str());
    assert_eq!(body["analysis"]["sentenceCount"], 2);

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/texts/{}", id),
            Some("alice"),
            Some(json!({ "content": "Updated content here." })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/texts/{}/words", id), Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["wordCount"], 3);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/api/texts/{}", id), Some("bob"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/texts/{}", id), Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request("GET", &format!("/api/texts/{}", id), Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_payload_is_rejected() {
    let (app, _) = app();
    let response = app
        .oneshot(request(
            "POST",
            "/api/texts",
            Some("alice"),
            Some(json!({ "title": "   ", "content": "body" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analysis_quota_returns_429() {
    let mut config = AppConfig::default();
    config.rate_limit.analysis = PolicyConfig {
        window_ms: 60_000,
        max_requests: 2,
        identity: IdentityMode::User,
    };
    let (app, _) = app_with(config);
    let id = create(&app, "alice", "One two three.").await;
    let uri = format!("/api/texts/{}/sentences", id);

    for expected_remaining in ["1", "0"] {
        let response = app
            .clone()
            .oneshot(request("GET", &uri, Some("alice"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["ratelimit-remaining"], expected_remaining);
        assert_eq!(response.headers()["ratelimit-limit"], "2");
    }

    let response = app
        .clone()
        .oneshot(request("GET", &uri, Some("alice"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);
    assert!(response.headers().contains_key("ratelimit-reset"));
    let body = json_body(response).await;
    assert_eq!(body["error"], "Too many analysis requests, please try again later.");
    assert_eq!(body["retryAfter"], retry_after);

    // The quota is per user
    let other = create(&app, "bob", "Hello.").await;
    let response = app
        .oneshot(request(
            "GET",
            &format!("/api/texts/{}/sentences", other),
            Some("bob"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_rate_limit_skips_store() {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    let (app, store) = app_with(config);

    let response = app.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = app();
    let response = app.oneshot(request("GET", "/metrics", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn health_rejections_with_forged_addresses(config: AppConfig) -> usize {
    let (app, _) = app_with(config);
    let mut rejected = 0;
    for i in 0..40 {
        let request = Request::builder()
            .uri("/health")
            .header("x-forwarded-for", format!("not-an-ip-{}", i))
            .header("x-real-ip", format!("198.51.100.{}", i))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            rejected += 1;
        }
    }
    rejected
}

#[tokio::test]
async fn test_forwarded_headers_do_not_split_quota() {
    // health_check allows 30 per minute per address
    assert_eq!(health_rejections_with_forged_addresses(AppConfig::default()).await, 10);
}

#[tokio::test]
async fn test_trusted_proxy_headers_identify_clients() {
    let mut config = AppConfig::default();
    config.server.trust_proxy_headers = true;
    // Unparsable X-Forwarded-For is skipped, each X-Real-IP is a distinct client
    assert_eq!(health_rejections_with_forged_addresses(config).await, 0);
}
