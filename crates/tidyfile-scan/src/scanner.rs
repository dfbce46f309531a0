//! JWalk-based directory scanner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use jwalk::{Parallelism, WalkDirGeneric};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tidyfile_core::{
    extension_of, FileRecord, ScanConfig, ScanError, ScanFilters, ScanIndex, ScanWarning,
    WarningKind,
};

use crate::inode::DirTracker;
use crate::metadata::extract;
use crate::progress::{ProgressTracker, ScanProgress};

/// Walker client state: the per-entry flag marks directories that were not
/// descended because they had already been visited.
type WalkState = ((), bool);

/// How often (in discovered files) a progress snapshot is broadcast.
const PROGRESS_INTERVAL: u64 = 1000;

/// Directory scanner building a [`ScanIndex`].
///
/// Traversal uses jwalk's parallel walker; metadata extraction for the
/// discovered files runs on a rayon pool. The scanner holds no state
/// between calls other than its progress channel and cancellation token.
pub struct Scanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl Scanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self::with_cancel(CancellationToken::new())
    }

    /// Create a scanner that stops early once `cancel` is triggered.
    pub fn with_cancel(cancel: CancellationToken) -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            cancel,
        }
    }

    /// Token that cancels scans run by this scanner.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan the configured root.
    ///
    /// Fails only on preconditions (missing root, root not a directory,
    /// invalid filters). Unreadable directories and files are recorded in
    /// [`ScanIndex::skipped_paths`]. A cancelled scan returns the files
    /// indexed so far with [`ScanIndex::is_complete`] set to false.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanIndex, ScanError> {
        let start = Instant::now();
        let scanned_at = Utc::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        let filters = Arc::new(config.filters()?);
        let mut tracker = ProgressTracker::new();
        let mut warnings = Vec::new();
        let mut complete = true;

        debug!(root = %root_path.display(), "scan started");

        let candidates = self.walk(
            config,
            &root_path,
            filters,
            &mut tracker,
            &mut warnings,
            &mut complete,
        );
        let records =
            self.extract_all(config, &candidates, &mut tracker, &mut warnings, &mut complete)?;

        warnings.sort_by(|a, b| a.path.cmp(&b.path));
        warnings.dedup_by(|a, b| a.path == b.path && a.kind == b.kind);

        let _ = self.progress_tx.send(tracker.snapshot());
        info!(
            root = %root_path.display(),
            files = records.len(),
            skipped = warnings.len(),
            complete,
            elapsed_ms = tracker.elapsed().as_millis() as u64,
            "scan finished"
        );

        Ok(ScanIndex::new(
            root_path,
            scanned_at,
            start.elapsed(),
            config.clone(),
            records,
            warnings,
            complete,
        ))
    }

    /// Walk the tree and collect the paths of files that pass the filters.
    fn walk(
        &self,
        config: &ScanConfig,
        root_path: &Path,
        filters: Arc<ScanFilters>,
        tracker: &mut ProgressTracker,
        warnings: &mut Vec<ScanWarning>,
        complete: &mut bool,
    ) -> Vec<PathBuf> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let follow = config.follow_symlinks;
        let visited = Arc::new(DirTracker::new());

        let dir_filters = Arc::clone(&filters);
        let walker = WalkDirGeneric::<WalkState>::new(root_path)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(follow)
            .sort(true)
            .min_depth(1)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |depth, path, _state, children| {
                // The first call lists the root itself; filters apply below it.
                if depth.is_none() {
                    return;
                }

                // Prune excluded subtrees before they are read.
                children.retain(|child| match child {
                    Ok(entry) if entry.file_type().is_dir() => {
                        !dir_filters.excludes_dir(&entry.file_name().to_string_lossy())
                    }
                    _ => true,
                });

                if follow {
                    let current = path.canonicalize().ok();
                    for entry in children.iter_mut().flatten() {
                        if entry.file_type().is_dir()
                            && entry.path_is_symlink()
                            && is_revisit(&visited, current.as_deref(), &entry.path())
                        {
                            entry.read_children_path = None;
                            entry.client_state = true;
                        }
                    }
                }
            });

        let mut candidates = Vec::new();

        for entry_result in walker {
            if self.cancel.is_cancelled() {
                *complete = false;
                break;
            }

            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    let warning = if err.loop_ancestor().is_some() {
                        ScanWarning::symlink_cycle(path)
                    } else if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        ScanWarning::permission_denied(path)
                    } else {
                        ScanWarning::new(path, err.to_string(), WarningKind::ReadError)
                    };
                    warn!(path = %warning.path.display(), "{}", warning.message);
                    tracker.record_warning();
                    warnings.push(warning);
                    continue;
                }
            };

            let file_type = entry.file_type();
            let path = entry.path();

            if file_type.is_dir() {
                tracker.record_dir();
                if entry.client_state {
                    warn!(path = %path.display(), "directory already visited, skipping cycle");
                    tracker.record_warning();
                    warnings.push(ScanWarning::symlink_cycle(path));
                }
                continue;
            }

            if file_type.is_symlink() {
                // Either links are not followed, or the target is gone.
                debug!(path = %path.display(), "skipping symlink");
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !filters.includes_file(&name, &extension_of(&path)) {
                continue;
            }

            tracker.record_file();
            if tracker.snapshot_due(PROGRESS_INTERVAL) {
                tracker.set_current_path(path.clone());
                let _ = self.progress_tx.send(tracker.snapshot());
            }
            candidates.push(path);
        }

        candidates
    }

    /// Extract metadata for every candidate on a bounded rayon pool.
    fn extract_all(
        &self,
        config: &ScanConfig,
        candidates: &[PathBuf],
        tracker: &mut ProgressTracker,
        warnings: &mut Vec<ScanWarning>,
        complete: &mut bool,
    ) -> Result<Vec<FileRecord>, ScanError> {
        let cancel = &self.cancel;
        let extract_one = |path: &PathBuf| -> Option<Result<FileRecord, ScanError>> {
            if cancel.is_cancelled() {
                return None;
            }
            Some(extract(path))
        };

        let results: Vec<Option<Result<FileRecord, ScanError>>> = match config.threads {
            0 => candidates.par_iter().map(extract_one).collect(),
            n => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScanError::InvalidConfig {
                        message: format!("failed to build thread pool: {e}"),
                    })?;
                pool.install(|| candidates.par_iter().map(extract_one).collect())
            }
        };

        let mut records = Vec::with_capacity(results.len());
        for (path, result) in candidates.iter().zip(results) {
            match result {
                Some(Ok(record)) => {
                    tracker.record_indexed(1, record.size_bytes);
                    records.push(record);
                }
                Some(Err(err)) => {
                    warn!(path = %path.display(), error = %err, "skipping file");
                    tracker.record_warning();
                    warnings.push(ScanWarning::from_error(path, &err));
                }
                None => *complete = false,
            }
        }

        Ok(records)
    }
}

/// Whether a followed directory link leads back into the current chain of
/// directories or to a target another link has already expanded.
fn is_revisit(visited: &DirTracker, current: Option<&Path>, link: &Path) -> bool {
    let Ok(target) = link.canonicalize() else {
        return false;
    };
    if current.is_some_and(|dir| dir.starts_with(&target)) {
        return true;
    }
    !visited.track_path(&target)
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
