use crate::api::NodeState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    nodepacks_dir: String,
    cached_schemas: usize,
    populated_at: Option<DateTime<Utc>>,
    uptime_seconds: u64,
}

/// Reports cache state without triggering a scan
pub async fn health_check(State(state): State<Arc<NodeState>>) -> Json<HealthResponse> {
    let cached_schemas = state.registry.cached().map(|r| r.len()).unwrap_or(0);
    let nodepacks_dir = state.registry.nodepacks_dir();

    Json(HealthResponse {
        status: if nodepacks_dir.exists() {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        nodepacks_dir: nodepacks_dir.display().to_string(),
        cached_schemas,
        populated_at: state.registry.populated_at(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
