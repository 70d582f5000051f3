//! Axum route handlers for the expense approval server.
//!
//! # Routes
//!
//! - `GET  /health`         — Returns `{"status": "ok", "version": ...}`
//! - `GET  /providers`      — All registered capability cards
//! - `GET  /providers/:id`  — One capability card
//! - `POST /query`          — Classify and route a free-form request
//!
//! Identity headers (set by the authentication boundary in front of this
//! service): `x-subject-id` and `x-role` (`employee` or `admin`).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::a2a::types::{CallerContext, Role};
use crate::app::AppCore;
use crate::router::QueryRequest;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AppCore>,
}

impl AppState {
    pub fn new(core: AppCore) -> Self {
        Self {
            core: Arc::new(core),
        }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/providers", get(list_providers_handler))
        .route("/providers/:id", get(get_provider_handler))
        .route("/query", post(query_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "expense-flow",
    }))
}

/// GET /providers — all registered capability cards.
async fn list_providers_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "providers": state.core.registry.list() }))
}

/// GET /providers/{id} — one provider's card.
async fn get_provider_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.core.registry.find_by_provider(&id) {
        Some(card) => Ok(Json(serde_json::json!(card))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("Provider '{}' not found", id)})),
        )),
    }
}

/// POST /query — classify and route a free-form request.
///
/// The response is always a structured `QueryResponse`; denials, validation
/// failures and unknown intents come back with `success = false`, never as
/// a 5xx.
async fn query_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let context = caller_from_headers(&headers).map_err(|message| {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": message})),
        )
    })?;

    let response = state.core.router.route(request, &context).await;
    Ok(Json(serde_json::json!(response)))
}

fn caller_from_headers(headers: &HeaderMap) -> Result<CallerContext, String> {
    let subject_id = headers
        .get("x-subject-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing x-subject-id header".to_string())?;

    let role = match headers.get("x-role").and_then(|v| v.to_str().ok()) {
        Some("admin") => Role::Admin,
        Some("employee") | None => Role::Employee,
        Some(other) => return Err(format!("Unknown role '{other}'")),
    };

    Ok(CallerContext::new(subject_id, role))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
