use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to scan {path}: {cause}")]
    ScanFailed { path: String, cause: String },

    #[error("Failed to introspect {path}: {cause}")]
    IntrospectionFailed { path: String, cause: String },

    #[error("Schema generation failed for {function}: {cause}")]
    GenerationFailed { function: String, cause: String },

    #[error("Node schema not found: {name}")]
    SchemaNotFound { name: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            RegistryError::ScanFailed { path, cause } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "scan_failed".to_string(),
                    message: "Failed to scan the nodepacks directory".to_string(),
                    path: Some(path.clone()),
                    cause: Some(cause.clone()),
                },
            ),
            RegistryError::IntrospectionFailed { path, cause } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "introspection_failed".to_string(),
                    message: "Failed to read functions from a nodepack".to_string(),
                    path: Some(path.clone()),
                    cause: Some(cause.clone()),
                },
            ),
            RegistryError::GenerationFailed { function, cause } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "generation_failed".to_string(),
                    message: format!("Failed to build schema for function '{}'", function),
                    path: None,
                    cause: Some(cause.clone()),
                },
            ),
            RegistryError::SchemaNotFound { name } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "schema_not_found".to_string(),
                    message: format!("No node schema named '{}'", name),
                    path: None,
                    cause: None,
                },
            ),
            RegistryError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "internal_error".to_string(),
                    message: msg.clone(),
                    path: None,
                    cause: None,
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
