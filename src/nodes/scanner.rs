use crate::error::{RegistryError, Result};
use crate::nodes::generator::SchemaGenerator;
use crate::nodes::introspect::FunctionIntrospector;
use crate::nodes::record::SchemaRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const OPS_FILE_NAME: &str = "ops.py";

/// Walks `<nodepacks>/<pack>/ops.py` and builds one record per function
pub struct SchemaScanner<'a> {
    introspector: &'a dyn FunctionIntrospector,
    generator: &'a dyn SchemaGenerator,
}

impl<'a> SchemaScanner<'a> {
    pub fn new(introspector: &'a dyn FunctionIntrospector, generator: &'a dyn SchemaGenerator) -> Self {
        Self {
            introspector,
            generator,
        }
    }

    /// Nodepack directories under `nodepacks_dir`, sorted by name.
    /// `__`-prefixed directories (`__pycache__` and friends) are excluded.
    pub fn find_nodepacks(&self, nodepacks_dir: &Path) -> Result<Vec<PathBuf>> {
        if !nodepacks_dir.exists() {
            debug!(
                "Nodepacks directory {:?} does not exist, returning empty list",
                nodepacks_dir
            );
            return Ok(Vec::new());
        }

        let mut packs = Vec::new();

        for entry in fs::read_dir(nodepacks_dir).map_err(|e| RegistryError::ScanFailed {
            path: nodepacks_dir.display().to_string(),
            cause: format!("Failed to read nodepacks directory: {}", e),
        })? {
            let entry = entry.map_err(|e| RegistryError::ScanFailed {
                path: nodepacks_dir.display().to_string(),
                cause: format!("Failed to read directory entry: {}", e),
            })?;

            let path = entry.path();
            if !path.is_dir() || entry.file_name().to_string_lossy().starts_with("__") {
                continue;
            }
            packs.push(path);
        }

        // Sort for consistent ordering
        packs.sort();

        Ok(packs)
    }

    pub fn scan(&self, nodepacks_dir: &Path) -> Result<Vec<SchemaRecord>> {
        let packs = self.find_nodepacks(nodepacks_dir)?;
        if packs.is_empty() {
            return Ok(Vec::new());
        }

        let root = nodepacks_dir
            .canonicalize()
            .map_err(|e| RegistryError::ScanFailed {
                path: nodepacks_dir.display().to_string(),
                cause: format!("Failed to resolve absolute path: {}", e),
            })?;

        let mut records = Vec::new();

        for pack in &packs {
            let Some(pack_name) = pack.file_name() else {
                continue;
            };
            let ops_file = root.join(pack_name).join(OPS_FILE_NAME);
            if !ops_file.exists() {
                debug!("No {} in {:?}, skipping", OPS_FILE_NAME, pack);
                continue;
            }

            let functions = self.introspector.functions_in_file(&ops_file)?;
            for function in &functions {
                let schema = self.generator.schema_from_function(function)?;
                records.push(SchemaRecord::from_schema(schema, &ops_file)?);
            }

            debug!("Loaded {} nodes from {:?}", functions.len(), ops_file);
        }

        info!(
            "Discovered {} node schemas in {} nodepacks under {:?}",
            records.len(),
            packs.len(),
            root
        );

        Ok(records)
    }
}
