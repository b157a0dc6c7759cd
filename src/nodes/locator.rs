//! Nodepacks directory resolution
//!
//! Search order:
//! 1. `<component_dir>/../nodepacks` (packaged layout)
//! 2. the first `<ancestor>/nodepacks` found walking up from `component_dir`
//! 3. `<working_dir>/nodepacks`, whether or not it exists

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const NODEPACKS_DIR_NAME: &str = "nodepacks";

#[derive(Debug, Clone)]
pub struct NodepackLocator {
    component_dir: PathBuf,
    working_dir: PathBuf,
    pinned: Option<PathBuf>,
}

impl NodepackLocator {
    pub fn new(component_dir: &Path, working_dir: &Path) -> Self {
        Self {
            component_dir: component_dir.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            pinned: None,
        }
    }

    /// Locator anchored at the running executable and the process working directory
    pub fn from_process() -> Self {
        let working_dir = env::current_dir().unwrap_or_else(|e| {
            warn!("Could not read current directory, using '.': {}", e);
            PathBuf::from(".")
        });

        let component_dir = env::current_exe()
            .and_then(|exe| exe.canonicalize())
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| {
                warn!("Could not locate executable, searching from {:?}", working_dir);
                working_dir.clone()
            });

        Self::new(&component_dir, &working_dir)
    }

    /// Always resolve to `dir`, skipping the search
    pub fn pinned(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pinned = Some(dir.into());
        self
    }

    pub fn resolve(&self) -> PathBuf {
        self.resolve_with(|path| path.exists())
    }

    /// Search order with the existence check supplied by the caller
    fn resolve_with(&self, exists: impl Fn(&Path) -> bool) -> PathBuf {
        if let Some(dir) = &self.pinned {
            return dir.clone();
        }

        if let Some(parent) = self.component_dir.parent() {
            let packaged = parent.join(NODEPACKS_DIR_NAME);
            if exists(&packaged) {
                debug!("Using packaged nodepacks at {:?}", packaged);
                return packaged;
            }
        }

        let mut current = self.component_dir.as_path();
        while let Some(parent) = current.parent() {
            let candidate = current.join(NODEPACKS_DIR_NAME);
            if exists(&candidate) {
                debug!("Found nodepacks at {:?}", candidate);
                return candidate;
            }
            current = parent;
        }

        let fallback = self.working_dir.join(NODEPACKS_DIR_NAME);
        debug!("Falling back to {:?}", fallback);
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_packaged_layout_wins() {
        let temp_dir = TempDir::new().unwrap();
        let component = temp_dir.path().join("pkg").join("backend");
        fs::create_dir_all(&component).unwrap();
        fs::create_dir_all(temp_dir.path().join("pkg").join("nodepacks")).unwrap();
        // A nodepacks dir next to the component is checked only after the packaged one
        fs::create_dir_all(component.join("nodepacks")).unwrap();

        let locator = NodepackLocator::new(&component, temp_dir.path());
        assert_eq!(locator.resolve(), temp_dir.path().join("pkg").join("nodepacks"));
    }

    #[test]
    fn test_walks_up_to_nearest_ancestor() {
        let temp_dir = TempDir::new().unwrap();
        let component = temp_dir.path().join("project").join("target").join("debug");
        fs::create_dir_all(&component).unwrap();
        fs::create_dir_all(temp_dir.path().join("project").join("nodepacks")).unwrap();

        let locator = NodepackLocator::new(&component, Path::new("/nonexistent-cwd"));
        assert_eq!(
            locator.resolve(),
            temp_dir.path().join("project").join("nodepacks")
        );
    }

    #[test]
    fn test_falls_back_to_working_dir() {
        let locator = NodepackLocator::new(Path::new("/srv/app/bin"), Path::new("/home/user/project"));

        let resolved = locator.resolve_with(|_| false);
        assert_eq!(resolved, PathBuf::from("/home/user/project/nodepacks"));
    }

    #[test]
    fn test_search_order() {
        let locator = NodepackLocator::new(Path::new("/srv/app/bin"), Path::new("/work"));

        // Packaged sibling beats one inside the component dir
        let existing = [Path::new("/srv/app/nodepacks"), Path::new("/srv/app/bin/nodepacks")];
        assert_eq!(
            locator.resolve_with(|p| existing.contains(&p)),
            PathBuf::from("/srv/app/nodepacks")
        );

        // Nearest ancestor wins during the upward walk
        let existing = [Path::new("/srv/nodepacks"), Path::new("/srv/app/bin/nodepacks")];
        assert_eq!(
            locator.resolve_with(|p| existing.contains(&p)),
            PathBuf::from("/srv/app/bin/nodepacks")
        );

        // The filesystem root itself is not searched
        let existing = [Path::new("/nodepacks")];
        assert_eq!(
            locator.resolve_with(|p| existing.contains(&p)),
            PathBuf::from("/work/nodepacks")
        );
    }

    #[test]
    fn test_pinned_skips_search() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("nodepacks")).unwrap();

        let locator = NodepackLocator::new(temp_dir.path(), temp_dir.path()).pinned("/opt/packs");
        assert_eq!(locator.resolve(), PathBuf::from("/opt/packs"));
    }
}
