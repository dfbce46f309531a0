//! File system scanning engine for tidyfile.
//!
//! This crate walks a directory tree and builds a [`ScanIndex`] of the files
//! it finds.
//!
//! # Overview
//!
//! - **Parallel traversal** via jwalk/rayon
//! - **Subtree pruning** by directory name or glob pattern
//! - **Symlink cycle detection** when links are followed
//! - **Progress updates** via broadcast channels
//! - **Cancellation** through a shared token, yielding a partial index
//!
//! # Example
//!
//! ```rust,no_run
//! use tidyfile_scan::{Scanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let index = Scanner::new().scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", index.total_size());
//! println!("Total files: {}", index.len());
//! for skipped in index.skipped_paths() {
//!     eprintln!("skipped {}: {}", skipped.path.display(), skipped.message);
//! }
//! ```

mod inode;
pub mod metadata;
mod progress;
mod scanner;

pub use inode::{DirId, DirTracker};
pub use metadata::extract;
pub use progress::ScanProgress;
pub use scanner::Scanner;

// Re-export core types for convenience
pub use tidyfile_core::{
    FileRecord, ScanConfig, ScanError, ScanIndex, ScanWarning, TypeCategory, WarningKind,
};
