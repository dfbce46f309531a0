//! Core types and configuration for tidyfile.
//!
//! This crate provides the data model shared by the scanner, the analyzers
//! and the organizer: file records, the scan index, the extension table and
//! scan configuration.

mod category;
mod config;
mod error;
mod index;
mod record;

pub use category::TypeCategory;
pub use config::{ScanConfig, ScanConfigBuilder, ScanFilters};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use index::ScanIndex;
pub use record::{extension_of, ContentHash, FileRecord};
