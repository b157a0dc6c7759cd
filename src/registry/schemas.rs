//! Schema Registry
//!
//! Memoizes one full nodepacks scan. The cache counts as populated only
//! while it holds at least one record, so an empty scan is repeated on the
//! next request.

use crate::error::{RegistryError, Result};
use crate::nodes::{
    FunctionIntrospector, NodeSchemaGenerator, NodepackLocator, PythonIntrospector,
    SchemaGenerator, SchemaRecord, SchemaScanner,
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

#[derive(Default)]
struct SchemaCache {
    records: Arc<Vec<SchemaRecord>>,
    populated_at: Option<DateTime<Utc>>,
}

pub struct SchemaRegistry {
    locator: NodepackLocator,
    introspector: Box<dyn FunctionIntrospector>,
    generator: Box<dyn SchemaGenerator>,
    cache: RwLock<SchemaCache>,
}

impl SchemaRegistry {
    /// Registry reading Python nodepacks with the default node schema shape
    pub fn new(locator: NodepackLocator) -> Self {
        Self::with_collaborators(
            locator,
            Box::new(PythonIntrospector::new()),
            Box::new(NodeSchemaGenerator::new()),
        )
    }

    pub fn with_collaborators(
        locator: NodepackLocator,
        introspector: Box<dyn FunctionIntrospector>,
        generator: Box<dyn SchemaGenerator>,
    ) -> Self {
        Self {
            locator,
            introspector,
            generator,
            cache: RwLock::new(SchemaCache::default()),
        }
    }

    /// Where the next scan would look
    pub fn nodepacks_dir(&self) -> PathBuf {
        self.locator.resolve()
    }

    /// Cached records, scanning only if nothing is cached yet
    pub fn populate(&self) -> Result<Arc<Vec<SchemaRecord>>> {
        let cached = self.cached()?;
        if !cached.is_empty() {
            return Ok(cached);
        }

        let nodepacks_dir = self.locator.resolve();
        debug!("Scanning nodepacks in {:?}", nodepacks_dir);

        let scanner = SchemaScanner::new(self.introspector.as_ref(), self.generator.as_ref());
        let records = Arc::new(scanner.scan(&nodepacks_dir)?);

        let mut cache = self.cache.write().map_err(|_| lock_poisoned())?;
        cache.records = records.clone();
        if !records.is_empty() {
            cache.populated_at = Some(Utc::now());
            info!("Cached {} node schemas", records.len());
        }

        Ok(records)
    }

    pub fn list_all(&self) -> Result<Arc<Vec<SchemaRecord>>> {
        self.populate()
    }

    /// First record named exactly `name`, in scan order
    pub fn get(&self, name: &str) -> Result<Option<SchemaRecord>> {
        let records = self.populate()?;
        Ok(records.iter().find(|r| r.name == name).cloned())
    }

    /// Current cache contents without triggering a scan
    pub fn cached(&self) -> Result<Arc<Vec<SchemaRecord>>> {
        let cache = self.cache.read().map_err(|_| lock_poisoned())?;
        Ok(cache.records.clone())
    }

    pub fn populated_at(&self) -> Option<DateTime<Utc>> {
        self.cache.read().ok().and_then(|cache| cache.populated_at)
    }
}

fn lock_poisoned() -> RegistryError {
    RegistryError::Internal("Schema cache lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::FunctionDescriptor;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn create_math_pack(nodepacks: &Path) {
        fs::create_dir_all(nodepacks.join("math")).unwrap();
        fs::create_dir_all(nodepacks.join("__cache__")).unwrap();
        fs::write(
            nodepacks.join("math").join("ops.py"),
            "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n",
        )
        .unwrap();
        fs::write(
            nodepacks.join("__cache__").join("ops.py"),
            "def ignored():\n    pass\n",
        )
        .unwrap();
    }

    fn registry_for(nodepacks: &Path) -> SchemaRegistry {
        let locator = NodepackLocator::new(nodepacks, nodepacks).pinned(nodepacks);
        SchemaRegistry::new(locator)
    }

    /// Counts how often files are introspected
    struct CountingIntrospector {
        calls: Arc<AtomicUsize>,
    }

    impl FunctionIntrospector for CountingIntrospector {
        fn functions_in_file(&self, path: &Path) -> Result<Vec<FunctionDescriptor>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PythonIntrospector.functions_in_file(path)
        }
    }

    fn counting_registry(nodepacks: &Path) -> (SchemaRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = SchemaRegistry::with_collaborators(
            NodepackLocator::new(nodepacks, nodepacks).pinned(nodepacks),
            Box::new(CountingIntrospector {
                calls: calls.clone(),
            }),
            Box::new(NodeSchemaGenerator),
        );
        (registry, calls)
    }

    #[test]
    fn test_list_all_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let nodepacks = temp_dir.path().join("nodepacks");
        create_math_pack(&nodepacks);

        let registry = registry_for(&nodepacks);
        let records = registry.list_all().unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["add", "sub"]);
        assert!(registry.get("ignored").unwrap().is_none());
        assert!(registry.populated_at().is_some());
    }

    #[test]
    fn test_populate_returns_same_cache() {
        let temp_dir = TempDir::new().unwrap();
        let nodepacks = temp_dir.path().join("nodepacks");
        create_math_pack(&nodepacks);

        let (registry, calls) = counting_registry(&nodepacks);
        let first = registry.populate().unwrap();
        let second = registry.populate().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // New packs are not picked up once cached
        fs::create_dir_all(nodepacks.join("text")).unwrap();
        fs::write(nodepacks.join("text").join("ops.py"), "def upper(s):\n    return s\n").unwrap();
        assert_eq!(registry.list_all().unwrap().len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_result_rescans() {
        let temp_dir = TempDir::new().unwrap();
        let nodepacks = temp_dir.path().join("nodepacks");
        fs::create_dir_all(nodepacks.join("empty")).unwrap();
        fs::write(nodepacks.join("empty").join("ops.py"), "# nothing yet\n").unwrap();

        let (registry, calls) = counting_registry(&nodepacks);
        assert!(registry.list_all().unwrap().is_empty());
        assert!(registry.list_all().unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(registry.populated_at().is_none());

        fs::write(nodepacks.join("empty").join("ops.py"), "def late():\n    pass\n").unwrap();
        let records = registry.list_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "late");
    }

    #[test]
    fn test_get_returns_first_match() {
        let temp_dir = TempDir::new().unwrap();
        let nodepacks = temp_dir.path().join("nodepacks");
        fs::create_dir_all(nodepacks.join("a")).unwrap();
        fs::create_dir_all(nodepacks.join("b")).unwrap();
        fs::write(nodepacks.join("a").join("ops.py"), "def scale(x):\n    pass\n").unwrap();
        fs::write(nodepacks.join("b").join("ops.py"), "def scale(x, y):\n    pass\n").unwrap();

        let registry = registry_for(&nodepacks);
        let record = registry.get("scale").unwrap().unwrap();
        assert!(record.filepath.ends_with(&format!("a{}ops.py", std::path::MAIN_SEPARATOR)));

        assert!(registry.get("Scale").unwrap().is_none());
        assert!(registry.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = registry_for(&temp_dir.path().join("nodepacks"));

        assert!(registry.list_all().unwrap().is_empty());
        assert!(registry.cached().unwrap().is_empty());
    }

    #[test]
    fn test_scan_error_propagates() {
        let temp_dir = TempDir::new().unwrap();
        let nodepacks = temp_dir.path().join("nodepacks");
        create_math_pack(&nodepacks);
        fs::create_dir_all(nodepacks.join("broken")).unwrap();
        fs::write(nodepacks.join("broken").join("ops.py"), "def oops(:\n").unwrap();

        let registry = registry_for(&nodepacks);
        assert!(registry.list_all().is_err());
        assert!(registry.get("add").is_err());
        assert!(registry.cached().unwrap().is_empty());
    }
}
