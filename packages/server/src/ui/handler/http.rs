//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::StatsDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Connection and subscription counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    Json(state.repository.stats().await.into())
}
