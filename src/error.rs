//! Unified error type for storage, counter and startup failures.
//!
//! `AppError` is returned by every fallible operation in the crate. The
//! monitoring loop never propagates it past a single cycle: it is logged with
//! its `kind` and the loop carries on.

use std::path::{Path, PathBuf};

/// Application-level error.
///
/// Each variant maps to a distinct failure domain.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Filesystem and `/proc` / `/sys` access failures.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage root could not be determined.
    #[error("{0}")]
    Config(String),
}

impl AppError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Io { .. } => "Io",
            AppError::Config(_) => "Config",
        }
    }

    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
