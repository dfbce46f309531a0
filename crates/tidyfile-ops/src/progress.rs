//! Progress reporting for plan execution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Progress information for a running plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationProgress {
    /// Number of actions finished, whatever their outcome.
    pub actions_completed: usize,
    /// Total number of actions in the plan.
    pub actions_total: usize,
    /// Number of bytes moved or copied so far.
    pub bytes_processed: u64,
    /// Bytes the plan expects to transfer.
    pub bytes_total: u64,
    /// The file currently being processed.
    pub current_file: Option<PathBuf>,
    /// Failed actions so far.
    pub failed: usize,
}

impl OperationProgress {
    /// Create a new progress tracker for a plan.
    pub fn new(actions_total: usize, bytes_total: u64) -> Self {
        Self {
            actions_completed: 0,
            actions_total,
            bytes_processed: 0,
            bytes_total,
            current_file: None,
            failed: 0,
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_processed as f64 / self.bytes_total as f64) * 100.0
        } else if self.actions_total > 0 {
            (self.actions_completed as f64 / self.actions_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Check if any action has failed.
    pub fn has_errors(&self) -> bool {
        self.failed > 0
    }

    /// Update the current file being processed.
    pub fn set_current_file(&mut self, path: Option<PathBuf>) {
        self.current_file = path;
    }

    /// Count a finished action and the bytes it transferred.
    pub fn complete_action(&mut self, bytes: u64, failed: bool) {
        self.actions_completed += 1;
        self.bytes_processed += bytes;
        if failed {
            self.failed += 1;
        }
    }
}
