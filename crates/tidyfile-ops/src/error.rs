//! Error types for planning and execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a plan from being built or executed.
///
/// Failures of individual actions are not errors at this level; they are
/// recorded in the [`ExecutionReport`](crate::ExecutionReport).
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// A path precondition failed.
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// The destination root cannot be created or written to.
    #[error("Destination {path} is not writable: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two actions target the same destination.
    #[error("Conflicting plan: {destination} is targeted by both {first} and {second}")]
    PlanConflict {
        destination: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// The keepers-only policy was requested without duplicate results.
    #[error("The keepers_only policy requires a duplicate report")]
    DuplicatesRequired,
}

impl OrganizeError {
    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
