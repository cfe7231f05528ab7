// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::middleware::user_id;
use super::routes::AppState;
use crate::cache::CacheStats;
use crate::documents::{CreateDocument, Document, UpdateDocument};
use crate::error::AppError;
use axum::async_trait;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// The user the request is made on behalf of, taken from `X-User-Id`.
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id(&parts.headers)
            .map(|id| AuthenticatedUser(id.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    pub cache: CacheStats,
}

/// Always 200; a store outage only degrades the reported status.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.documents.cache_health().await {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        timestamp: chrono::Utc::now().to_rfc3339(),
        cache: state.documents.cache_stats().await,
    })
}

pub async fn metrics_handler() -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
        .into_response()
}

pub async fn create_text(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Json(request): Json<CreateDocument>,
) -> Result<Response, AppError> {
    let text = state.documents.create(&owner, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Text created successfully", "text": text })),
    )
        .into_response())
}

pub async fn list_texts(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
) -> Result<Json<Value>, AppError> {
    let texts: Vec<Document> = state.documents.list(&owner).await?;
    debug!("Listing {} texts for user {}", texts.len(), owner);
    Ok(Json(json!({ "message": "Texts retrieved successfully", "texts": texts })))
}

pub async fn get_text(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let text = state.documents.get(&id, &owner).await?;
    Ok(Json(json!({ "message": "Text retrieved successfully", "text": text })))
}

pub async fn update_text(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
    Json(changes): Json<UpdateDocument>,
) -> Result<Json<Value>, AppError> {
    let text = state.documents.update(&id, &owner, changes).await?;
    Ok(Json(json!({ "message": "Text updated successfully", "text": text })))
}

pub async fn delete_text(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.documents.delete(&id, &owner).await?;
    Ok(Json(json!({ "message": "Text deleted successfully" })))
}

pub async fn full_analysis(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let analysis = state.documents.analyze(&id, &owner).await?;
    Ok(Json(json!({ "textId": id, "analysis": analysis })))
}

pub async fn word_count(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let count = state.documents.word_count(&id, &owner).await?;
    Ok(Json(json!({ "textId": id, "wordCount": count })))
}

pub async fn character_count(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let count = state.documents.character_count(&id, &owner).await?;
    Ok(Json(json!({ "textId": id, "characterCount": count })))
}

pub async fn sentence_count(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let count = state.documents.sentence_count(&id, &owner).await?;
    Ok(Json(json!({ "textId": id, "sentenceCount": count })))
}

pub async fn paragraph_count(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let count = state.documents.paragraph_count(&id, &owner).await?;
    Ok(Json(json!({ "textId": id, "paragraphCount": count })))
}

pub async fn longest_words(
    State(state): State<AppState>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let words = state.documents.longest_words(&id, &owner).await?;
    Ok(Json(json!({ "textId": id, "longestWords": words })))
}
