//! Destination collision handling.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Insert ` (n)` before the extension.
///
/// For "file.txt", returns "file (n).txt"; for "Makefile", "Makefile (n)".
pub fn suffixed_path(path: &Path, n: u32) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let mut name = OsString::from(path.file_stem().unwrap_or_default());
    name.push(format!(" ({n})"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    parent.join(name)
}

/// Hands out unique destination paths in a deterministic order.
///
/// A destination is taken when an earlier call reserved it or when
/// something already exists there on disk.
#[derive(Debug, Default)]
pub(crate) struct DestinationAllocator {
    reserved: HashSet<PathBuf>,
    next_suffix: HashMap<PathBuf, u32>,
}

impl DestinationAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a path outright. Returns false if it was already claimed.
    pub fn reserve(&mut self, path: &Path) -> bool {
        self.reserved.insert(path.to_path_buf())
    }

    /// Claim `natural`, or the first free suffixed variant of it.
    pub fn allocate(&mut self, natural: &Path) -> PathBuf {
        if self.is_free(natural) {
            self.reserved.insert(natural.to_path_buf());
            return natural.to_path_buf();
        }

        let counter = self.next_suffix.entry(natural.to_path_buf()).or_insert(1);
        loop {
            let candidate = suffixed_path(natural, *counter);
            *counter += 1;
            if !self.reserved.contains(&candidate) && !exists(&candidate) {
                self.reserved.insert(candidate.clone());
                return candidate;
            }
        }
    }

    fn is_free(&self, path: &Path) -> bool {
        !self.reserved.contains(path) && !exists(path)
    }
}

/// Existence check that also sees dangling symlinks.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
