//! Visited-directory tracking for symlink cycle detection.

use std::path::{Path, PathBuf};

use dashmap::DashSet;

/// Identity of a directory on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DirId {
    /// Device and inode number.
    Inode { device: u64, inode: u64 },
    /// Canonical path, where inode numbers are not available.
    Canonical(PathBuf),
}

impl DirId {
    /// Resolve the identity of the directory a path points to, following
    /// symlinks. Returns `None` if the target cannot be stat'd.
    #[cfg(unix)]
    pub fn of(path: &Path) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        let metadata = std::fs::metadata(path).ok()?;
        Some(Self::Inode {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    pub fn of(path: &Path) -> Option<Self> {
        path.canonicalize().ok().map(Self::Canonical)
    }
}

/// Tracks directories already descended into.
///
/// Walker threads share one tracker, so the set is concurrent.
#[derive(Debug, Default)]
pub struct DirTracker {
    seen: DashSet<DirId>,
}

impl DirTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self {
            seen: DashSet::new(),
        }
    }

    /// Track a directory. Returns `true` if this is the first time seeing it.
    pub fn track(&self, id: DirId) -> bool {
        self.seen.insert(id)
    }

    /// Track the directory at a path. Unresolvable paths count as new so
    /// that the walker reports its own error for them.
    pub fn track_path(&self, path: &Path) -> bool {
        match DirId::of(path) {
            Some(id) => self.track(id),
            None => true,
        }
    }

    /// Get the number of distinct directories tracked.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_track_new_dir() {
        let tracker = DirTracker::new();
        let id = DirId::Inode { device: 1, inode: 12345 };

        assert!(tracker.track(id.clone()));
        assert!(!tracker.track(id)); // Second time returns false
    }

    #[test]
    fn test_different_devices() {
        let tracker = DirTracker::new();

        assert!(tracker.track(DirId::Inode { device: 1, inode: 12345 }));
        assert!(tracker.track(DirId::Inode { device: 2, inode: 12345 }));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_same_dir_via_different_paths() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("sub");
        std::fs::create_dir(&dir).unwrap();

        let tracker = DirTracker::new();
        assert!(tracker.track_path(&dir));
        assert!(!tracker.track_path(&temp.path().join("sub/../sub")));
    }
}
