//! Physical/virtual interface classification.
//!
//! An interface is physical when its sysfs entry has a `device` link (a backing
//! hardware device); everything else (loopback, bridges, tunnels, veth pairs)
//! is virtual. Classification is taken once at startup and reused for the
//! whole run, see [`Classification`].

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterfaceCategory {
    Physical,
    Virtual,
}

impl InterfaceCategory {
    pub const ALL: [InterfaceCategory; 2] = [InterfaceCategory::Physical, InterfaceCategory::Virtual];

    /// Folder under the storage root holding this category's files.
    pub fn dir_name(self) -> &'static str {
        match self {
            InterfaceCategory::Physical => config::PHYSICAL_DIR_NAME,
            InterfaceCategory::Virtual => config::VIRTUAL_DIR_NAME,
        }
    }

    /// File name of the category-wide total.
    pub fn aggregate_file_name(self) -> &'static str {
        match self {
            InterfaceCategory::Physical => config::PHYSICAL_TOTAL_FILE,
            InterfaceCategory::Virtual => config::VIRTUAL_TOTAL_FILE,
        }
    }
}

impl fmt::Display for InterfaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceCategory::Physical => f.write_str("physical"),
            InterfaceCategory::Virtual => f.write_str("virtual"),
        }
    }
}

/// Enumerates interface names per category.
///
/// An unavailable data source yields an empty set, never an error.
pub trait InterfaceClassifier {
    /// Every interface currently known, regardless of category.
    fn list_all(&self) -> BTreeSet<String>;

    fn is_physical(&self, name: &str) -> bool;

    fn list_interfaces(&self, category: InterfaceCategory) -> BTreeSet<String> {
        self.list_all()
            .into_iter()
            .filter(|name| {
                let physical = self.is_physical(name);
                match category {
                    InterfaceCategory::Physical => physical,
                    InterfaceCategory::Virtual => !physical,
                }
            })
            .collect()
    }
}

/// Classifier backed by `/sys/class/net`.
pub struct SysfsClassifier {
    root: PathBuf,
}

impl SysfsClassifier {
    pub fn new() -> Self {
        Self::with_root(config::SYSFS_NET_DIR)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for SysfsClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceClassifier for SysfsClassifier {
    fn list_all(&self) -> BTreeSet<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            tracing::debug!("{} not readable, no interfaces listed", self.root.display());
            return BTreeSet::new();
        };
        entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }

    fn is_physical(&self, name: &str) -> bool {
        self.root.join(name).join("device").exists()
    }
}

/// Interface membership captured once at startup.
///
/// Names not present in the physical set (including interfaces that appear
/// after startup) resolve to [`InterfaceCategory::Virtual`].
#[derive(Debug, Clone, Default)]
pub struct Classification {
    physical: BTreeSet<String>,
    virtual_: BTreeSet<String>,
}

impl Classification {
    pub fn capture(classifier: &dyn InterfaceClassifier) -> Self {
        Self {
            physical: classifier.list_interfaces(InterfaceCategory::Physical),
            virtual_: classifier.list_interfaces(InterfaceCategory::Virtual),
        }
    }

    pub fn members(&self, category: InterfaceCategory) -> &BTreeSet<String> {
        match category {
            InterfaceCategory::Physical => &self.physical,
            InterfaceCategory::Virtual => &self.virtual_,
        }
    }

    pub fn category_of(&self, name: &str) -> InterfaceCategory {
        if self.physical.contains(name) {
            InterfaceCategory::Physical
        } else {
            InterfaceCategory::Virtual
        }
    }

    /// True when the interface was seen by the startup enumeration.
    pub fn is_known(&self, name: &str) -> bool {
        self.physical.contains(name) || self.virtual_.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sysfs() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["eth0", "wlp3s0"] {
            std::fs::create_dir_all(dir.path().join(name).join("device")).unwrap();
        }
        for name in ["lo", "docker0"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        dir
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sysfs_classifier_splits_by_device_link() {
        let dir = fake_sysfs();
        let classifier = SysfsClassifier::with_root(dir.path());

        assert_eq!(
            classifier.list_interfaces(InterfaceCategory::Physical),
            set(&["eth0", "wlp3s0"])
        );
        assert_eq!(
            classifier.list_interfaces(InterfaceCategory::Virtual),
            set(&["docker0", "lo"])
        );
        assert_eq!(classifier.list_all().len(), 4);
    }

    #[test]
    fn test_missing_sysfs_yields_empty_sets() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = SysfsClassifier::with_root(dir.path().join("absent"));
        assert!(classifier.list_all().is_empty());
        assert!(classifier.list_interfaces(InterfaceCategory::Physical).is_empty());
    }

    #[test]
    fn test_classification_unknown_name_falls_back_to_virtual() {
        let dir = fake_sysfs();
        let classification = Classification::capture(&SysfsClassifier::with_root(dir.path()));

        assert_eq!(classification.category_of("eth0"), InterfaceCategory::Physical);
        assert_eq!(classification.category_of("lo"), InterfaceCategory::Virtual);
        assert_eq!(classification.category_of("usb0"), InterfaceCategory::Virtual);
        assert!(!classification.is_known("usb0"));
        assert!(classification.is_known("docker0"));
    }

    #[test]
    fn test_category_layout_names() {
        assert_eq!(InterfaceCategory::Physical.dir_name(), "PhysicalInterfaces");
        assert_eq!(InterfaceCategory::Virtual.dir_name(), "VirtualInterfaces");
        assert_eq!(
            InterfaceCategory::Physical.aggregate_file_name(),
            "TotalPhysicalUsage"
        );
        assert_eq!(
            InterfaceCategory::Virtual.aggregate_file_name(),
            "TotalVirtualUsage"
        );
    }
}
