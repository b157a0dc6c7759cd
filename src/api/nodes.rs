//! Node schema endpoints
//!
//! - GET /nodes/schemas - All discovered node schemas
//! - GET /nodes/schemas/:name - One node schema by exact name

use crate::api::NodeState;
use crate::error::{RegistryError, Result};
use crate::nodes::SchemaRecord;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

pub async fn list_schemas(State(state): State<Arc<NodeState>>) -> Result<Json<Vec<SchemaRecord>>> {
    let records = state.registry.list_all()?;
    debug!("Serving {} node schemas", records.len());
    Ok(Json(Vec::clone(&records)))
}

pub async fn get_schema(
    State(state): State<Arc<NodeState>>,
    Path(name): Path<String>,
) -> Result<Json<SchemaRecord>> {
    state
        .registry
        .get(&name)?
        .map(Json)
        .ok_or(RegistryError::SchemaNotFound { name })
}
