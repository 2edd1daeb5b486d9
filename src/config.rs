//! Centralized runtime constants for netusage.
//!
//! Intervals, unit sizes, and the on-disk layout names live here so they can be
//! found and adjusted in a single place rather than scattered across modules.

use std::path::PathBuf;

use crate::error::AppError;

/// Pause between two polling cycles (seconds).
pub const POLL_INTERVAL_SECS: u64 = 3;

/// Bytes in one megabyte as written to history files.
pub const BYTES_PER_MEGABYTE: u64 = 1_048_576;

/// Bytes in one gigabyte.
pub const BYTES_PER_GIGABYTE: u64 = 1_073_741_824;

/// Directory created under the home directory when no explicit root is given.
pub const STORAGE_DIR_NAME: &str = "NetworkUsage";

/// Environment variable that overrides the storage root.
pub const STORAGE_ROOT_ENV: &str = "NETUSAGE_ROOT";

pub const PHYSICAL_DIR_NAME: &str = "PhysicalInterfaces";
pub const VIRTUAL_DIR_NAME: &str = "VirtualInterfaces";
pub const PHYSICAL_TOTAL_FILE: &str = "TotalPhysicalUsage";
pub const VIRTUAL_TOTAL_FILE: &str = "TotalVirtualUsage";

/// Kernel interface directory; an entry with a `device` child is backed by hardware.
pub const SYSFS_NET_DIR: &str = "/sys/class/net";

/// Kernel per-interface counter table.
pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// Resolve the directory that holds both category folders.
///
/// `$NETUSAGE_ROOT` wins when set and non-empty, otherwise `~/NetworkUsage`.
pub fn storage_root() -> Result<PathBuf, AppError> {
    resolve_storage_root(std::env::var_os(STORAGE_ROOT_ENV), dirs::home_dir())
}

fn resolve_storage_root(
    explicit: Option<std::ffi::OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, AppError> {
    if let Some(root) = explicit.filter(|r| !r.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    home.map(|h| h.join(STORAGE_DIR_NAME)).ok_or_else(|| {
        AppError::Config(format!(
            "no home directory found and {STORAGE_ROOT_ENV} is not set"
        ))
    })
}
