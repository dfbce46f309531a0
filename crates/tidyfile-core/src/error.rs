//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Path exists but is not what the operation expects.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a per-item access error. Unlike [`ScanError::io`], a missing
    /// path is reported as an I/O failure since the item existed when it
    /// was enumerated.
    pub fn access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a per-item access failure (permission or I/O).
    pub fn is_access(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::Io { .. })
    }

    /// Whether this is a precondition failure on the given path.
    pub fn is_invalid_path(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath { .. } | Self::NotFound { .. } | Self::NotADirectory { .. }
        )
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// Directory was already visited through another symlink.
    SymlinkCycle,
}

/// Non-fatal warning encountered during scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a symlink cycle warning.
    pub fn symlink_cycle(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Symlink cycle, not descending: {}", path.display()),
            path,
            kind: WarningKind::SymlinkCycle,
        }
    }

    /// Create a warning from a failed metadata extraction.
    pub fn from_error(path: impl Into<PathBuf>, error: &ScanError) -> Self {
        let kind = match error {
            ScanError::PermissionDenied { .. } => WarningKind::PermissionDenied,
            _ => WarningKind::MetadataError,
        };
        Self::new(path, error.to_string(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));
        assert!(err.is_access());
        assert!(!err.is_invalid_path());
    }

    #[test]
    fn test_access_error_keeps_vanished_files_as_io() {
        let err = ScanError::access(
            "/vanished",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::Io { .. }));
        assert!(err.is_access());
    }

    #[test]
    fn test_scan_error_not_found_is_invalid_path() {
        let err = ScanError::io(
            "/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_scan_warning_creation() {
        let warning = ScanWarning::permission_denied("/test/path");
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert!(warning.message.contains("Permission denied"));

        let cycle = ScanWarning::symlink_cycle("/test/loop");
        assert_eq!(cycle.kind, WarningKind::SymlinkCycle);
    }

    #[test]
    fn test_warning_from_error() {
        let err = ScanError::invalid_path("/dev/null", "not a regular file");
        let warning = ScanWarning::from_error("/dev/null", &err);
        assert_eq!(warning.kind, WarningKind::MetadataError);
        assert!(warning.message.contains("not a regular file"));
    }
}
