//! On-disk persistence of daily usage history.
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/PhysicalInterfaces/<interface>
//! <root>/PhysicalInterfaces/TotalPhysicalUsage
//! <root>/VirtualInterfaces/<interface>
//! <root>/VirtualInterfaces/TotalVirtualUsage
//! ```
//!
//! Each file is plain text, one line per day; see [`history`] for the grammar.

pub mod history;

use std::path::{Path, PathBuf};

use crate::core::InterfaceCategory;
use crate::error::AppError;

pub use history::{load, save};

/// Paths of every history file under one storage root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: InterfaceCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    pub fn interface_path(&self, category: InterfaceCategory, interface: &str) -> PathBuf {
        self.category_dir(category).join(interface)
    }

    pub fn aggregate_path(&self, category: InterfaceCategory) -> PathBuf {
        self.category_dir(category).join(category.aggregate_file_name())
    }

    /// Create both category folders (and the root) if missing.
    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for category in InterfaceCategory::ALL {
            let dir = self.category_dir(category);
            std::fs::create_dir_all(&dir).map_err(|e| AppError::io(&dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = StorageLayout::new("/home/alice/NetworkUsage");
        assert_eq!(
            layout.interface_path(InterfaceCategory::Physical, "eth0"),
            PathBuf::from("/home/alice/NetworkUsage/PhysicalInterfaces/eth0")
        );
        assert_eq!(
            layout.interface_path(InterfaceCategory::Virtual, "lo"),
            PathBuf::from("/home/alice/NetworkUsage/VirtualInterfaces/lo")
        );
        assert_eq!(
            layout.aggregate_path(InterfaceCategory::Physical),
            PathBuf::from("/home/alice/NetworkUsage/PhysicalInterfaces/TotalPhysicalUsage")
        );
        assert_eq!(
            layout.aggregate_path(InterfaceCategory::Virtual),
            PathBuf::from("/home/alice/NetworkUsage/VirtualInterfaces/TotalVirtualUsage")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("a").join("NetworkUsage"));

        layout.ensure_dirs().unwrap();
        assert!(layout.category_dir(InterfaceCategory::Physical).is_dir());
        assert!(layout.category_dir(InterfaceCategory::Virtual).is_dir());

        // Idempotent.
        layout.ensure_dirs().unwrap();
    }

    #[test]
    fn test_ensure_dirs_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("occupied");
        std::fs::write(&root, "not a directory").unwrap();

        let err = StorageLayout::new(&root).ensure_dirs().unwrap_err();
        assert_eq!(err.kind(), "Io");
    }
}
