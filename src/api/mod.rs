mod health;
mod nodes;

pub use health::health_check;
pub use nodes::{get_schema, list_schemas};

use crate::registry::SchemaRegistry;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for node schema endpoints
pub struct NodeState {
    pub registry: Arc<SchemaRegistry>,
    pub started_at: Instant,
}

impl NodeState {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/nodes/schemas", get(list_schemas))
        .route("/nodes/schemas/:name", get(get_schema))
        // The editor is served from its own origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
