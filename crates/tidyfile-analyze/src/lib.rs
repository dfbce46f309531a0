//! Analysis algorithms for tidyfile.
//!
//! This crate provides analysis capabilities for scan indexes:
//!
//! - **Content hashing** - Streaming SHA-256 (default) or BLAKE3 digests
//! - **Duplicate detection** - Group byte-identical files and pick a keeper
//! - **Summaries** - Category, age and size statistics
//!
//! # Duplicate Detection
//!
//! Uses a three-phase algorithm for efficiency:
//!
//! 1. Group files by size
//! 2. Compute partial hash (first + last 4KB) for size-matched files
//! 3. Compute the full hash for partial-hash matches
//!
//! ```rust,ignore
//! use tidyfile_analyze::{DuplicateFinder, summarize};
//! use tidyfile_scan::{Scanner, ScanConfig};
//!
//! let index = Scanner::new().scan(&ScanConfig::new("/path/to/scan")).unwrap();
//!
//! let report = DuplicateFinder::new().find_duplicates(&index);
//! println!("Found {} duplicate groups", report.group_count);
//! println!("Wasted space: {} bytes", report.total_wasted_space);
//!
//! let summary = summarize(&index, Some(&report));
//! for bucket in &summary.age_buckets {
//!     println!("{}: {} files", bucket.name, bucket.file_count);
//! }
//! ```

pub mod age;
mod duplicates;
pub mod hasher;
mod summary;

pub use age::{AgeBucket, AgeBucketStats, format_age};
pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateGroup, DuplicateReport,
    HashFailure,
};
pub use hasher::{ContentHasher, HashAlgorithm, HashError};
pub use summary::{
    AnalysisReport, CategoryStats, DuplicateSummary, FileRef, Summarizer, SummaryConfig,
    SummaryConfigBuilder, summarize,
};

// Re-export core types
pub use tidyfile_core::{ContentHash, FileRecord, ScanIndex};
