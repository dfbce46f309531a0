//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// Number of files discovered so far.
    pub files_found: u64,
    /// Number of directories entered so far.
    pub dirs_scanned: u64,
    /// Number of files whose metadata has been extracted.
    pub files_indexed: u64,
    /// Total bytes indexed so far.
    pub bytes_indexed: u64,
    /// Current path being scanned.
    pub current_path: PathBuf,
    /// Number of skipped paths so far.
    pub warnings_count: u64,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_found: 0,
            dirs_scanned: 0,
            files_indexed: 0,
            bytes_indexed: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_found as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal progress tracker with timing.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    files_found: u64,
    dirs_scanned: u64,
    files_indexed: u64,
    bytes_indexed: u64,
    warnings_count: u64,
    current_path: PathBuf,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            files_found: 0,
            dirs_scanned: 0,
            files_indexed: 0,
            bytes_indexed: 0,
            warnings_count: 0,
            current_path: PathBuf::new(),
        }
    }

    pub fn record_file(&mut self) {
        self.files_found += 1;
    }

    pub fn record_dir(&mut self) {
        self.dirs_scanned += 1;
    }

    pub fn record_warning(&mut self) {
        self.warnings_count += 1;
    }

    pub fn record_indexed(&mut self, count: u64, bytes: u64) {
        self.files_indexed += count;
        self.bytes_indexed += bytes;
    }

    pub fn set_current_path(&mut self, path: PathBuf) {
        self.current_path = path;
    }

    /// True every `interval` discovered files.
    pub fn snapshot_due(&self, interval: u64) -> bool {
        interval > 0 && self.files_found % interval == 0
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            files_found: self.files_found,
            dirs_scanned: self.dirs_scanned,
            files_indexed: self.files_indexed,
            bytes_indexed: self.bytes_indexed,
            current_path: self.current_path.clone(),
            warnings_count: self.warnings_count,
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_snapshot() {
        let mut tracker = ProgressTracker::new();
        tracker.record_dir();
        tracker.record_file();
        tracker.record_file();
        tracker.record_warning();
        tracker.record_indexed(2, 300);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.files_found, 2);
        assert_eq!(snapshot.dirs_scanned, 1);
        assert_eq!(snapshot.files_indexed, 2);
        assert_eq!(snapshot.bytes_indexed, 300);
        assert_eq!(snapshot.warnings_count, 1);
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        assert_eq!(ScanProgress::new().files_per_second(), 0.0);
    }
}
