use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Serializable description of one discovered node operation
///
/// Serializes as a single flat object: `name`, the generator's fields,
/// then `filepath`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Absolute path of the `ops.py` the node was read from
    pub filepath: String,
}

impl SchemaRecord {
    /// Build a record from a generated schema, overriding any `filepath` it carries
    pub fn from_schema(mut schema: Map<String, Value>, filepath: &Path) -> Result<Self> {
        let name = match schema.remove("name") {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(RegistryError::GenerationFailed {
                    function: other.to_string(),
                    cause: "schema 'name' must be a string".to_string(),
                })
            }
            None => {
                return Err(RegistryError::GenerationFailed {
                    function: filepath.display().to_string(),
                    cause: "schema has no 'name'".to_string(),
                })
            }
        };

        schema.remove("filepath");

        Ok(Self {
            name,
            fields: schema,
            filepath: filepath.display().to_string(),
        })
    }
}
