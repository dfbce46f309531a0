//! Scan configuration types.

use std::collections::HashSet;
use std::path::PathBuf;

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Extensions to index (empty = all). Case-insensitive, dot optional.
    #[builder(default)]
    #[serde(default)]
    pub include_extensions: Vec<String>,

    /// Directory names (or glob patterns) whose subtrees are pruned.
    #[builder(default)]
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited). Files directly under
    /// the root are at depth 1.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Include hidden files and directories (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Number of threads for metadata extraction (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref patterns) = self.exclude_dirs {
            for pattern in patterns {
                Glob::new(pattern)
                    .map_err(|e| format!("Invalid exclude pattern {pattern:?}: {e}"))?;
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_extensions: Vec::new(),
            exclude_dirs: Vec::new(),
            follow_symlinks: false,
            max_depth: None,
            include_hidden: true,
            threads: 0,
        }
    }

    /// Compile the name filters once so they can be shared across walker threads.
    pub fn filters(&self) -> Result<ScanFilters, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_dirs {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("invalid exclude pattern {pattern:?}: {e}"),
            })?;
            builder.add(glob);
        }
        let exclude_dirs = builder.build().map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })?;

        let extensions = self
            .include_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(ScanFilters {
            exclude_dirs,
            extensions,
            include_hidden: self.include_hidden,
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Compiled inclusion and exclusion rules for a scan.
#[derive(Debug, Clone)]
pub struct ScanFilters {
    exclude_dirs: GlobSet,
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl ScanFilters {
    /// Check if a directory with this name should be pruned.
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.is_hidden_skipped(name) || self.exclude_dirs.is_match(name)
    }

    /// Check if a file with this name and lowercase extension should be indexed.
    pub fn includes_file(&self, name: &str, extension: &str) -> bool {
        if self.is_hidden_skipped(name) {
            return false;
        }
        self.extensions.is_empty() || self.extensions.contains(extension)
    }

    fn is_hidden_skipped(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .threads(4usize)
            .follow_symlinks(true)
            .max_depth(Some(3u32))
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert_eq!(config.threads, 4);
        assert!(config.follow_symlinks);
        assert_eq!(config.max_depth, Some(3));
    }

    #[test]
    fn test_config_simple() {
        let config = ScanConfig::new("/home/user");
        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert!(!config.follow_symlinks);
        assert!(config.include_hidden);
        assert!(config.include_extensions.is_empty());
    }

    #[test]
    fn test_builder_rejects_missing_root() {
        assert!(ScanConfig::builder().build().is_err());
        assert!(ScanConfig::builder().root("").build().is_err());
    }

    #[test]
    fn test_builder_rejects_bad_pattern() {
        let result = ScanConfig::builder()
            .root("/test")
            .exclude_dirs(vec!["[".to_string()])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_exclude_dirs() {
        let config = ScanConfig::builder()
            .root("/test")
            .exclude_dirs(vec!["node_modules".to_string(), ".*".to_string()])
            .build()
            .unwrap();
        let filters = config.filters().unwrap();

        assert!(filters.excludes_dir("node_modules"));
        assert!(filters.excludes_dir(".git"));
        assert!(!filters.excludes_dir("src"));
    }

    #[test]
    fn test_include_extensions() {
        let config = ScanConfig::builder()
            .root("/test")
            .include_extensions(vec![".PDF".to_string(), "jpg".to_string()])
            .build()
            .unwrap();
        let filters = config.filters().unwrap();

        assert!(filters.includes_file("a.pdf", "pdf"));
        assert!(filters.includes_file("b.jpg", "jpg"));
        assert!(!filters.includes_file("c.txt", "txt"));
    }

    #[test]
    fn test_hidden_entries() {
        let mut config = ScanConfig::new("/test");
        assert!(config.filters().unwrap().includes_file(".env", ""));

        config.include_hidden = false;
        let filters = config.filters().unwrap();
        assert!(!filters.includes_file(".env", ""));
        assert!(filters.excludes_dir(".cache"));
        assert!(!filters.excludes_dir("src"));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: ScanConfig = serde_json::from_str(r#"{"root": "/data"}"#).unwrap();
        assert!(config.include_hidden);
        assert_eq!(config.threads, 0);
        assert!(config.max_depth.is_none());
    }
}
