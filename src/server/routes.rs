// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    character_count, create_text, delete_text, full_analysis, get_text, health_handler,
    list_texts, longest_words, metrics_handler, paragraph_count, sentence_count, update_text,
    word_count,
};
use super::middleware::{enforce_rate_limit, request_id_layers, track_metrics, RateLimitGuard};
use crate::config::AppConfig;
use crate::documents::DocumentService;
use crate::error::{AppError, Result};
use crate::ratelimit::RateLimiter;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub documents: Arc<DocumentService>,
}

pub fn create_router(
    config: AppConfig,
    documents: Arc<DocumentService>,
    limiter: Arc<RateLimiter>,
) -> Result<Router> {
    let guard = |purposes: &[&str]| -> Result<RateLimitGuard> {
        let policies = purposes
            .iter()
            .map(|purpose| {
                config.rate_limit.policy(purpose).ok_or_else(|| {
                    AppError::Config(format!("Unknown rate limit policy: {}", purpose))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RateLimitGuard::new(
            limiter.clone(),
            policies,
            config.server.trust_proxy_headers,
        ))
    };

    let health = guard(&["health_check"])?;
    let general = guard(&["general"])?;
    let modification = guard(&["general", "text_modification"])?;
    let analysis = guard(&["general", "analysis"])?;

    let texts: Router<AppState> = Router::new()
        .route(
            "/api/texts",
            get(list_texts)
                .route_layer(from_fn_with_state(general.clone(), enforce_rate_limit))
                .merge(
                    post(create_text)
                        .route_layer(from_fn_with_state(modification.clone(), enforce_rate_limit)),
                ),
        )
        .route(
            "/api/texts/:id",
            get(get_text)
                .route_layer(from_fn_with_state(general, enforce_rate_limit))
                .merge(
                    put(update_text)
                        .delete(delete_text)
                        .route_layer(from_fn_with_state(modification, enforce_rate_limit)),
                ),
        );

    let analysis_routes: Router<AppState> = Router::new()
        .route("/api/texts/:id/analysis", get(full_analysis))
        .route("/api/texts/:id/words", get(word_count))
        .route("/api/texts/:id/characters", get(character_count))
        .route("/api/texts/:id/sentences", get(sentence_count))
        .route("/api/texts/:id/paragraphs", get(paragraph_count))
        .route("/api/texts/:id/longest-words", get(longest_words))
        .route_layer(from_fn_with_state(analysis, enforce_rate_limit));

    let max_body_bytes = config.server.max_body_bytes;
    let state = AppState { config, documents };
    let (set_request_id, propagate_request_id) = request_id_layers();

    let app = Router::new()
        .route(
            "/health",
            get(health_handler).route_layer(from_fn_with_state(health, enforce_rate_limit)),
        )
        .route("/metrics", get(metrics_handler))
        .merge(texts)
        .merge(analysis_routes)
        .layer(from_fn(track_metrics))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state);

    Ok(app)
}
