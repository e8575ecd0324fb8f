//! Health endpoint

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::state::AppState;

/// Response for GET /health
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub is_live: bool,
    pub connections: usize,
    pub viewers: usize,
}

/// GET /health - Relay liveness and connection counts
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        is_live: state.registry.is_live(),
        connections: state.registry.connection_count(),
        viewers: state.registry.viewer_count(),
    })
}
