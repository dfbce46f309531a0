//! Plan execution.
//!
//! Actions run one after another. Each action succeeds, fails or is
//! skipped on its own; nothing is rolled back.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::OrganizeError;
use crate::plan::{ActionKind, OrganizationPlan, PlannedAction};
use crate::progress::OperationProgress;
use crate::OPERATION_CHANNEL_SIZE;

/// How a single action ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ActionStatus {
    Succeeded,
    Failed(String),
    Skipped(String),
}

/// Outcome of one planned action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub action_kind: ActionKind,
    pub status: ActionStatus,
}

/// Everything that happened while executing a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub destination_root: PathBuf,
    /// One entry per planned action, in plan order.
    pub outcomes: Vec<ActionOutcome>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub bytes_transferred: u64,
}

impl ExecutionReport {
    fn new(destination_root: PathBuf) -> Self {
        Self {
            destination_root,
            outcomes: Vec::new(),
            total: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            bytes_transferred: 0,
        }
    }

    fn record(&mut self, action: &PlannedAction, status: ActionStatus, bytes: u64) {
        self.total += 1;
        match status {
            ActionStatus::Succeeded => {
                self.succeeded += 1;
                self.bytes_transferred += bytes;
            }
            ActionStatus::Failed(_) => self.failed += 1,
            ActionStatus::Skipped(_) => self.skipped += 1,
        }
        self.outcomes.push(ActionOutcome {
            source_path: action.source_path.clone(),
            destination_path: action.destination_path.clone(),
            action_kind: action.action_kind,
            status,
        });
    }

    /// Check if no action failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Outcomes of failed actions.
    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ActionStatus::Failed(_)))
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        if self.failed == 0 {
            format!("{} succeeded, {} skipped", self.succeeded, self.skipped)
        } else {
            format!(
                "{} succeeded, {} failed, {} skipped",
                self.succeeded, self.failed, self.skipped
            )
        }
    }
}

/// Event sent while a plan executes in the background.
#[derive(Debug)]
pub enum ExecuteEvent {
    /// Progress update.
    Progress(OperationProgress),
    /// The run finished or its precondition failed.
    Complete(Result<ExecutionReport, OrganizeError>),
}

/// Applies [`OrganizationPlan`]s to the filesystem.
#[derive(Debug, Clone, Default)]
pub struct PlanExecutor {
    cancel: CancellationToken,
}

impl PlanExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor that skips the remaining actions once `cancel` fires.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Token that cancels runs of this executor.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute `plan`, blocking until every action has been attempted.
    ///
    /// Fails before touching any source file when the destination root
    /// cannot be created or written to.
    pub fn execute(&self, plan: &OrganizationPlan) -> Result<ExecutionReport, OrganizeError> {
        self.run(plan, |_| {})
    }

    /// Execute `plan` on the blocking pool, streaming progress events.
    pub fn start_execute(&self, plan: OrganizationPlan) -> mpsc::Receiver<ExecuteEvent> {
        let (tx, rx) = mpsc::channel(OPERATION_CHANNEL_SIZE);
        let executor = self.clone();

        tokio::task::spawn_blocking(move || {
            let result = executor.run(&plan, |progress| {
                let _ = tx.blocking_send(ExecuteEvent::Progress(progress.clone()));
            });
            let _ = tx.blocking_send(ExecuteEvent::Complete(result));
        });

        rx
    }

    fn run(
        &self,
        plan: &OrganizationPlan,
        mut on_progress: impl FnMut(&OperationProgress),
    ) -> Result<ExecutionReport, OrganizeError> {
        let start = Instant::now();
        ensure_writable(&plan.destination_root)?;

        let mut report = ExecutionReport::new(plan.destination_root.clone());
        let mut progress = OperationProgress::new(plan.actions.len(), plan.bytes_to_transfer());

        for action in &plan.actions {
            let (status, bytes) = if self.cancel.is_cancelled() {
                (ActionStatus::Skipped("cancelled".to_string()), 0)
            } else {
                progress.set_current_file(Some(action.source_path.clone()));
                on_progress(&progress);
                apply(action)
            };

            if let ActionStatus::Failed(ref reason) = status {
                warn!(
                    source = %action.source_path.display(),
                    destination = %action.destination_path.display(),
                    reason = %reason,
                    "action failed"
                );
            }

            progress.complete_action(bytes, matches!(status, ActionStatus::Failed(_)));
            report.record(action, status, bytes);
        }

        progress.set_current_file(None);
        on_progress(&progress);

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            bytes = report.bytes_transferred,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "plan executed"
        );
        Ok(report)
    }
}

/// Execute `plan` in the background with a default executor.
pub fn start_execute(plan: OrganizationPlan) -> mpsc::Receiver<ExecuteEvent> {
    PlanExecutor::new().start_execute(plan)
}

/// Create the root if needed and prove it accepts new files.
fn ensure_writable(root: &Path) -> Result<(), OrganizeError> {
    let unwritable = |source: io::Error| OrganizeError::DestinationUnwritable {
        path: root.to_path_buf(),
        source,
    };

    fs::create_dir_all(root).map_err(unwritable)?;
    let probe = tempfile::Builder::new()
        .prefix(".tidyfile-probe")
        .tempfile_in(root)
        .map_err(unwritable)?;
    probe.close().map_err(unwritable)
}

/// Run one action, returning its status and the bytes transferred.
fn apply(action: &PlannedAction) -> (ActionStatus, u64) {
    let source = action.source_path.as_path();
    let destination = action.destination_path.as_path();

    if action.action_kind == ActionKind::SkipConflict {
        let reason = action.reason.clone().unwrap_or_else(|| "skipped".to_string());
        return (ActionStatus::Skipped(reason), 0);
    }
    if destination.symlink_metadata().is_ok() {
        return (ActionStatus::Skipped("destination exists".to_string()), 0);
    }

    match transfer(action) {
        Ok(bytes) => {
            debug!(
                kind = %action.action_kind,
                source = %source.display(),
                destination = %destination.display(),
                "action succeeded"
            );
            (ActionStatus::Succeeded, bytes)
        }
        Err(reason) => (ActionStatus::Failed(reason), 0),
    }
}

fn transfer(action: &PlannedAction) -> Result<u64, String> {
    let source = action.source_path.as_path();
    let destination = action.destination_path.as_path();

    let size = fs::metadata(source)
        .map_err(|e| format!("Failed to read source: {e}"))?
        .len();
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create directory: {e}"))?;
    }
    match action.action_kind {
        ActionKind::Move => move_file(source, destination)?,
        _ => copy_file(source, destination).map_err(|e| format!("Failed to copy: {e}"))?,
    }
    Ok(size)
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(source: &Path, destination: &Path) -> Result<(), String> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(source, destination, |p| fs::remove_file(p))
        }
        Err(e) => Err(format!("Failed to move: {e}")),
    }
}

/// Copy `source`, then remove it. When the removal fails the copy is
/// deleted again so only the source remains.
fn copy_then_remove(
    source: &Path,
    destination: &Path,
    remove: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<(), String> {
    copy_file(source, destination).map_err(|e| format!("Failed to copy: {e}"))?;
    if let Err(e) = remove(source) {
        let _ = fs::remove_file(destination);
        return Err(format!("Failed to remove source after copy: {e}"));
    }
    Ok(())
}

/// Copy contents, permissions and modification time. Never replaces an
/// existing destination.
fn copy_file(source: &Path, destination: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let metadata = reader.metadata()?;
    let mut writer = File::options()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|_| {
        writer.set_permissions(metadata.permissions())?;
        writer.set_modified(metadata.modified()?)
    });
    if let Err(e) = copied {
        drop(writer);
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    use tempfile::TempDir;

    fn transfer(src: &Path, dst: &Path, kind: ActionKind) -> PlannedAction {
        PlannedAction::transfer(src.to_path_buf(), dst.to_path_buf(), kind, 0)
    }

    #[test]
    fn test_move_and_copy() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        fs::write(temp.path().join("m.txt"), "move me").unwrap();
        fs::write(temp.path().join("c.txt"), "copy me").unwrap();

        let plan = OrganizationPlan::new(
            out.clone(),
            vec![
                transfer(&temp.path().join("m.txt"), &out.join("a/m.txt"), ActionKind::Move),
                transfer(&temp.path().join("c.txt"), &out.join("b/c.txt"), ActionKind::Copy),
            ],
            Vec::new(),
        )
        .unwrap();

        let report = PlanExecutor::new().execute(&plan).unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.bytes_transferred, 14);
        assert!(!temp.path().join("m.txt").exists());
        assert!(temp.path().join("c.txt").exists());
        assert_eq!(fs::read_to_string(out.join("a/m.txt")).unwrap(), "move me");
        assert_eq!(fs::read_to_string(out.join("b/c.txt")).unwrap(), "copy me");
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("old.txt");
        let dst = temp.path().join("copy.txt");
        fs::write(&src, "data").unwrap();
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        File::options().write(true).open(&src).unwrap().set_modified(mtime).unwrap();

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_failed_source_removal_drops_the_copy() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "data").unwrap();

        let err = copy_then_remove(&src, &dst, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        })
        .unwrap_err();

        assert!(err.contains("read-only"));
        assert!(src.exists());
        assert!(!dst.exists());
    }

    #[test]
    fn test_copy_then_remove_moves_the_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "data").unwrap();

        copy_then_remove(&src, &dst, |p| fs::remove_file(p)).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dst).unwrap(), "data");
    }

    #[test]
    fn test_existing_destination_is_skipped() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.txt");
        let dst = temp.path().join("b.txt");
        fs::write(&src, "new").unwrap();
        fs::write(&dst, "old").unwrap();

        let plan = OrganizationPlan::new(
            temp.path().to_path_buf(),
            vec![transfer(&src, &dst, ActionKind::Move)],
            Vec::new(),
        )
        .unwrap();
        let report = PlanExecutor::new().execute(&plan).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "old");
        assert!(src.exists());
    }

    #[test]
    fn test_missing_source_fails_alone() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ok.txt"), "ok").unwrap();

        let plan = OrganizationPlan::new(
            temp.path().join("out"),
            vec![
                transfer(
                    &temp.path().join("gone.txt"),
                    &temp.path().join("out/gone.txt"),
                    ActionKind::Move,
                ),
                transfer(
                    &temp.path().join("ok.txt"),
                    &temp.path().join("out/ok.txt"),
                    ActionKind::Move,
                ),
            ],
            Vec::new(),
        )
        .unwrap();
        let report = PlanExecutor::new().execute(&plan).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failures().count(), 1);
        assert!(!report.is_success());
    }

    #[test]
    fn test_cancelled_run_skips_everything() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        let plan = OrganizationPlan::new(
            temp.path().join("out"),
            vec![transfer(
                &temp.path().join("a.txt"),
                &temp.path().join("out/a.txt"),
                ActionKind::Move,
            )],
            Vec::new(),
        )
        .unwrap();

        let executor = PlanExecutor::new();
        executor.cancel_token().cancel();
        let report = executor.execute(&plan).unwrap();

        assert_eq!(report.skipped, 1);
        assert!(temp.path().join("a.txt").exists());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(ActionStatus::Failed("boom".into())).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
    }
}
