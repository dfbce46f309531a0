//! Organization planning.
//!
//! The planner is pure with respect to the files it plans for: it only
//! reads the scan index, the duplicate report and whether candidate
//! destinations already exist.

use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use tidyfile_analyze::DuplicateReport;
use tidyfile_core::{FileRecord, ScanIndex, TypeCategory};

use crate::conflict::DestinationAllocator;
use crate::error::OrganizeError;
use crate::plan::{ActionKind, OrganizationPlan, PlannedAction};
use crate::rules::{LayoutRule, RuleKind};

/// Reason recorded for files whose destination is their current path.
pub const ALREADY_IN_PLACE: &str = "already in place";

/// Which members of duplicate groups are planned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Plan every file.
    #[default]
    KeepAll,
    /// Leave out every non-keeper duplicate.
    KeepersOnly,
}

/// How files reach their destination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

impl From<TransferMode> for ActionKind {
    fn from(mode: TransferMode) -> Self {
        match mode {
            TransferMode::Move => ActionKind::Move,
            TransferMode::Copy => ActionKind::Copy,
        }
    }
}

/// Organizer settings as they appear in configuration files.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct PlanOptions {
    /// Built-in layout rule.
    pub rule: RuleKind,

    /// Directory overrides per category for the type rule.
    pub category_dirs: BTreeMap<TypeCategory, PathBuf>,

    pub duplicate_policy: DuplicatePolicy,

    pub transfer_mode: TransferMode,
}

impl PlanOptions {
    /// Create a new options builder.
    pub fn builder() -> PlanOptionsBuilder {
        PlanOptionsBuilder::default()
    }

    /// The layout rule these options select.
    pub fn layout_rule(&self) -> Box<dyn LayoutRule> {
        self.rule.build(&self.category_dirs)
    }
}

/// Builds [`OrganizationPlan`]s from a scan index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner {
    mode: TransferMode,
}

impl Planner {
    /// Planner producing move actions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Planner producing actions of the given mode.
    pub fn with_mode(mode: TransferMode) -> Self {
        Self { mode }
    }

    /// Plan where every file in `index` should go under `destination_root`.
    ///
    /// Files already at their destination become skip actions and reserve
    /// that path. Every other file takes its natural destination or, when
    /// that is reserved or exists on disk, the first free ` (N)` variant.
    /// Files are visited in index order, so the plan is deterministic.
    pub fn plan(
        &self,
        index: &ScanIndex,
        destination_root: &Path,
        rule: &dyn LayoutRule,
        policy: DuplicatePolicy,
        duplicates: Option<&DuplicateReport>,
    ) -> Result<OrganizationPlan, OrganizeError> {
        let destination_root = resolve_root(destination_root)?;

        let redundant: HashSet<&Path> = match (policy, duplicates) {
            (DuplicatePolicy::KeepAll, _) => HashSet::new(),
            (DuplicatePolicy::KeepersOnly, Some(report)) => report.redundant_paths(),
            (DuplicatePolicy::KeepersOnly, None) => return Err(OrganizeError::DuplicatesRequired),
        };

        let mut planned: Vec<(&FileRecord, PathBuf)> = Vec::with_capacity(index.len());
        let mut excluded_duplicates = Vec::new();
        for record in index {
            if redundant.contains(record.path.as_path()) {
                excluded_duplicates.push(record.path.clone());
                continue;
            }
            let natural = natural_destination(&destination_root, rule, record)?;
            planned.push((record, natural));
        }

        // In-place files keep their path, so claim those first.
        let mut allocator = DestinationAllocator::new();
        for (record, natural) in &planned {
            if record.path == *natural {
                allocator.reserve(natural);
            }
        }

        let kind = ActionKind::from(self.mode);
        let mut actions = Vec::with_capacity(planned.len());
        for (record, natural) in planned {
            if record.path == natural {
                actions.push(PlannedAction::skip(
                    record.path.clone(),
                    natural,
                    record.size_bytes,
                    ALREADY_IN_PLACE,
                ));
                continue;
            }

            let destination = allocator.allocate(&natural);
            if destination != natural {
                debug!(
                    source = %record.path.display(),
                    destination = %destination.display(),
                    "destination taken, using suffixed name"
                );
            }
            actions.push(PlannedAction::transfer(
                record.path.clone(),
                destination,
                kind,
                record.size_bytes,
            ));
        }

        let plan = OrganizationPlan::new(destination_root, actions, excluded_duplicates)?;
        info!(
            rule = rule.name(),
            actions = plan.actionable(),
            in_place = plan.skipped(),
            excluded = plan.excluded_duplicates.len(),
            "plan ready"
        );
        Ok(plan)
    }
}

fn natural_destination(
    root: &Path,
    rule: &dyn LayoutRule,
    record: &FileRecord,
) -> Result<PathBuf, OrganizeError> {
    let subdir = rule.subdirectory(record);
    let escapes = subdir
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(OrganizeError::invalid_path(
            subdir,
            format!("layout rule {} produced a non-relative directory", rule.name()),
        ));
    }

    let file_name = record
        .path
        .file_name()
        .ok_or_else(|| OrganizeError::invalid_path(&record.path, "record has no file name"))?;
    Ok(root.join(subdir).join(file_name))
}

/// Absolute, symlink-free form of the destination root.
///
/// The root may not exist yet: the deepest existing ancestor is
/// canonicalized and the missing components are appended to it.
fn resolve_root(root: &Path) -> Result<PathBuf, OrganizeError> {
    let absolute = std::path::absolute(root)
        .map_err(|e| OrganizeError::invalid_path(root, e.to_string()))?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while existing.symlink_metadata().is_err() {
        match (existing.parent(), existing.components().next_back()) {
            (Some(parent), Some(last)) => {
                missing.push(last.as_os_str().to_os_string());
                existing = parent;
            }
            _ => return Err(OrganizeError::invalid_path(root, "no existing ancestor")),
        }
    }

    let mut resolved = existing
        .canonicalize()
        .map_err(|e| OrganizeError::invalid_path(existing, e.to_string()))?;
    if !resolved.is_dir() {
        return Err(OrganizeError::invalid_path(resolved, "not a directory"));
    }
    for name in missing.into_iter().rev() {
        if name == ".." {
            resolved.pop();
        } else if name != "." {
            resolved.push(name);
        }
    }
    Ok(resolved)
}

/// Plan with a move planner. Shorthand for [`Planner::plan`].
pub fn plan(
    index: &ScanIndex,
    destination_root: &Path,
    rule: &dyn LayoutRule,
    policy: DuplicatePolicy,
    duplicates: Option<&DuplicateReport>,
) -> Result<OrganizationPlan, OrganizeError> {
    Planner::new().plan(index, destination_root, rule, policy, duplicates)
}
