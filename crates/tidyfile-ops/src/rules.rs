//! Layout rules mapping file records to destination subdirectories.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use tidyfile_core::{FileRecord, TypeCategory};

/// Maps a record to a subdirectory relative to the destination root.
///
/// Implementations must be pure: the same record always yields the same
/// subdirectory.
pub trait LayoutRule: Send + Sync {
    /// Relative directory the file belongs in.
    fn subdirectory(&self, record: &FileRecord) -> PathBuf;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

/// One directory per type category, e.g. `document/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByType;

impl LayoutRule for ByType {
    fn subdirectory(&self, record: &FileRecord) -> PathBuf {
        PathBuf::from(record.type_category.as_str())
    }

    fn name(&self) -> &'static str {
        "type"
    }
}

/// One directory per extension, with `no_extension/` for bare names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByExtension;

impl LayoutRule for ByExtension {
    fn subdirectory(&self, record: &FileRecord) -> PathBuf {
        if record.extension.is_empty() {
            PathBuf::from("no_extension")
        } else {
            PathBuf::from(record.extension.as_str())
        }
    }

    fn name(&self) -> &'static str {
        "extension"
    }
}

/// `<category>/<YYYY>/<MM>/` from the modification time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByModifiedMonth;

impl LayoutRule for ByModifiedMonth {
    fn subdirectory(&self, record: &FileRecord) -> PathBuf {
        PathBuf::from(record.type_category.as_str())
            .join(record.modified_at.format("%Y").to_string())
            .join(record.modified_at.format("%m").to_string())
    }

    fn name(&self) -> &'static str {
        "month"
    }
}

/// Custom category to directory table; unmapped categories use their name.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    dirs: BTreeMap<TypeCategory, PathBuf>,
}

impl CategoryMap {
    pub fn new(dirs: BTreeMap<TypeCategory, PathBuf>) -> Self {
        Self { dirs }
    }

    /// Add or replace the directory for one category.
    pub fn with(mut self, category: TypeCategory, dir: impl Into<PathBuf>) -> Self {
        self.dirs.insert(category, dir.into());
        self
    }
}

impl LayoutRule for CategoryMap {
    fn subdirectory(&self, record: &FileRecord) -> PathBuf {
        self.dirs
            .get(&record.type_category)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(record.type_category.as_str()))
    }

    fn name(&self) -> &'static str {
        "category_map"
    }
}

/// Built-in rule selector used by configuration and the CLI.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RuleKind {
    #[default]
    Type,
    Extension,
    Month,
}

impl RuleKind {
    /// Build the rule. Category overrides only apply to the type rule.
    pub fn build(self, category_dirs: &BTreeMap<TypeCategory, PathBuf>) -> Box<dyn LayoutRule> {
        match self {
            Self::Type if category_dirs.is_empty() => Box::new(ByType),
            Self::Type => Box::new(CategoryMap::new(category_dirs.clone())),
            Self::Extension => Box::new(ByExtension),
            Self::Month => Box::new(ByModifiedMonth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::SystemTime;

    fn record(path: &str) -> FileRecord {
        let modified: SystemTime = Utc.with_ymd_and_hms(2023, 3, 9, 12, 0, 0).unwrap().into();
        FileRecord::new(path, 1, modified)
    }

    #[test]
    fn test_by_type() {
        assert_eq!(ByType.subdirectory(&record("/a/r.PDF")), PathBuf::from("document"));
        assert_eq!(ByType.subdirectory(&record("/a/x.weird")), PathBuf::from("other"));
    }

    #[test]
    fn test_by_extension() {
        assert_eq!(ByExtension.subdirectory(&record("/a/r.PDF")), PathBuf::from("pdf"));
        assert_eq!(
            ByExtension.subdirectory(&record("/a/Makefile")),
            PathBuf::from("no_extension")
        );
    }

    #[test]
    fn test_by_modified_month() {
        assert_eq!(
            ByModifiedMonth.subdirectory(&record("/a/p.jpg")),
            PathBuf::from("image/2023/03")
        );
    }

    #[test]
    fn test_category_map_fallback() {
        let rule = CategoryMap::default().with(TypeCategory::Image, "Pictures");
        assert_eq!(rule.subdirectory(&record("/a/p.jpg")), PathBuf::from("Pictures"));
        assert_eq!(rule.subdirectory(&record("/a/s.mp3")), PathBuf::from("audio"));
    }

    #[test]
    fn test_rule_kind() {
        assert_eq!("Month".parse::<RuleKind>().unwrap(), RuleKind::Month);
        let mut dirs = BTreeMap::new();
        assert_eq!(RuleKind::Type.build(&dirs).name(), "type");
        dirs.insert(TypeCategory::Video, PathBuf::from("Movies"));
        assert_eq!(RuleKind::Type.build(&dirs).name(), "category_map");
        assert_eq!(RuleKind::Extension.build(&dirs).name(), "extension");
    }
}
