//! Organization plan types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::OrganizeError;

/// What to do with a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    /// Move the file to its destination.
    Move,
    /// Copy the file, leaving the source in place.
    Copy,
    /// Leave the file alone.
    SkipConflict,
}

/// A single planned file transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAction {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub action_kind: ActionKind,
    /// Size of the source when it was scanned.
    pub size_bytes: u64,
    /// Why the action is a skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PlannedAction {
    /// Create a move or copy action.
    pub fn transfer(
        source_path: PathBuf,
        destination_path: PathBuf,
        action_kind: ActionKind,
        size_bytes: u64,
    ) -> Self {
        Self {
            source_path,
            destination_path,
            action_kind,
            size_bytes,
            reason: None,
        }
    }

    /// Create a skip action.
    pub fn skip(
        source_path: PathBuf,
        destination_path: PathBuf,
        size_bytes: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source_path,
            destination_path,
            action_kind: ActionKind::SkipConflict,
            size_bytes,
            reason: Some(reason.into()),
        }
    }

    /// Check if executing this action touches the filesystem.
    pub fn is_actionable(&self) -> bool {
        self.action_kind != ActionKind::SkipConflict
    }
}

/// An ordered, conflict-free set of file transfers under one destination root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationPlan {
    pub destination_root: PathBuf,
    pub actions: Vec<PlannedAction>,
    /// Redundant duplicates left out under the keepers-only policy.
    #[serde(default)]
    pub excluded_duplicates: Vec<PathBuf>,
}

impl OrganizationPlan {
    /// Create a plan and check it for destination conflicts.
    pub fn new(
        destination_root: PathBuf,
        actions: Vec<PlannedAction>,
        excluded_duplicates: Vec<PathBuf>,
    ) -> Result<Self, OrganizeError> {
        let plan = Self {
            destination_root,
            actions,
            excluded_duplicates,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Fail if two actions share a destination path.
    pub fn validate(&self) -> Result<(), OrganizeError> {
        let mut seen: HashMap<&Path, &Path> = HashMap::with_capacity(self.actions.len());
        for action in &self.actions {
            if let Some(first) = seen.insert(&action.destination_path, &action.source_path) {
                return Err(OrganizeError::PlanConflict {
                    destination: action.destination_path.clone(),
                    first: first.to_path_buf(),
                    second: action.source_path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Number of move and copy actions.
    pub fn actionable(&self) -> usize {
        self.actions.iter().filter(|a| a.is_actionable()).count()
    }

    /// Number of skip actions.
    pub fn skipped(&self) -> usize {
        self.actions.len() - self.actionable()
    }

    /// True when executing the plan would change nothing.
    pub fn is_noop(&self) -> bool {
        self.actionable() == 0
    }

    /// Bytes that move and copy actions will transfer.
    pub fn bytes_to_transfer(&self) -> u64 {
        self.actions
            .iter()
            .filter(|a| a.is_actionable())
            .map(|a| a.size_bytes)
            .sum()
    }
}
