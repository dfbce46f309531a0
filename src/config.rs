//! TOML configuration file support.
//!
//! A config file may carry any of three optional tables:
//!
//! ```toml
//! [scan]
//! exclude_dirs = [".git", "node_modules"]
//! include_hidden = false
//!
//! [duplicates]
//! min_size = 1024
//! algorithm = "blake3"
//!
//! [organize]
//! rule = "month"
//! duplicate_policy = "keepers_only"
//! ```
//!
//! Command-line flags override whatever the file sets.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

use tidyfile_analyze::DuplicateConfig;
use tidyfile_ops::PlanOptions;
use tidyfile_scan::ScanConfig;

/// Everything a config file can set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scan: ScanSettings,
    pub duplicates: DuplicateConfig,
    pub organize: PlanOptions,
}

/// Scan options without a root; the root always comes from the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSettings {
    pub include_extensions: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub follow_symlinks: bool,
    pub max_depth: Option<u32>,
    pub include_hidden: bool,
    pub threads: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            include_extensions: Vec::new(),
            exclude_dirs: Vec::new(),
            follow_symlinks: false,
            max_depth: None,
            include_hidden: true,
            threads: 0,
        }
    }
}

/// Scan flags given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub exclude_dirs: Vec<String>,
    pub extensions: Vec<String>,
    pub follow_symlinks: bool,
    pub max_depth: Option<u32>,
}

impl Settings {
    /// Load settings from `path`, or defaults when no file was given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl ScanSettings {
    /// Apply command-line overrides. Non-empty lists replace the file's lists.
    pub fn apply(&mut self, overrides: &ScanOverrides) {
        if !overrides.exclude_dirs.is_empty() {
            self.exclude_dirs = overrides.exclude_dirs.clone();
        }
        if !overrides.extensions.is_empty() {
            self.include_extensions = overrides.extensions.clone();
        }
        if overrides.follow_symlinks {
            self.follow_symlinks = true;
        }
        if overrides.max_depth.is_some() {
            self.max_depth = overrides.max_depth;
        }
    }

    /// Build a validated scan config for `root`.
    pub fn to_config(&self, root: impl Into<PathBuf>) -> Result<ScanConfig> {
        let config = ScanConfig::builder()
            .root(root)
            .include_extensions(self.include_extensions.clone())
            .exclude_dirs(self.exclude_dirs.clone())
            .follow_symlinks(self.follow_symlinks)
            .max_depth(self.max_depth)
            .include_hidden(self.include_hidden)
            .threads(self.threads)
            .build()
            .context("Invalid scan configuration")?;
        Ok(config)
    }
}
