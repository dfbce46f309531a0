//! Scan index container.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::record::{ContentHash, FileRecord};

/// Result of one directory scan.
///
/// Records keep traversal order and are keyed by path, so a path can appear
/// at most once. An index is never mutated after it is built; deriving a
/// variant (for example with content hashes) produces a new index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanIndex {
    root_path: PathBuf,
    scanned_at: DateTime<Utc>,
    scan_duration: Duration,
    complete: bool,
    config: ScanConfig,
    #[serde(with = "records_as_seq")]
    records: IndexMap<PathBuf, FileRecord>,
    skipped_paths: Vec<ScanWarning>,
}

impl ScanIndex {
    /// Assemble an index from scan output.
    ///
    /// If a path occurs more than once, the first record wins.
    pub fn new(
        root_path: PathBuf,
        scanned_at: DateTime<Utc>,
        scan_duration: Duration,
        config: ScanConfig,
        records: impl IntoIterator<Item = FileRecord>,
        skipped_paths: Vec<ScanWarning>,
        complete: bool,
    ) -> Self {
        let mut map = IndexMap::new();
        for record in records {
            map.entry(record.path.clone()).or_insert(record);
        }
        Self {
            root_path,
            scanned_at,
            scan_duration,
            complete,
            config,
            records: map,
            skipped_paths,
        }
    }

    /// Root path that was scanned.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// When the scan started.
    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// How long the scan took.
    pub fn scan_duration(&self) -> Duration {
        self.scan_duration
    }

    /// False when the scan was cancelled before it finished.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Configuration used for the scan.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Paths that were skipped, with the reason.
    pub fn skipped_paths(&self) -> &[ScanWarning] {
        &self.skipped_paths
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.skipped_paths.is_empty()
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no files were indexed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by path.
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Position of a path in traversal order.
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.records.get_index_of(path)
    }

    /// Iterate records in traversal order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Sum of all file sizes.
    pub fn total_size(&self) -> u64 {
        self.records.values().map(|r| r.size_bytes).sum()
    }

    /// New index with the given hashes attached to matching records.
    pub fn with_hashes(&self, hashes: &HashMap<PathBuf, ContentHash>) -> Self {
        let mut derived = self.clone();
        for (path, record) in derived.records.iter_mut() {
            if let Some(hash) = hashes.get(path) {
                record.content_hash = Some(*hash);
            }
        }
        derived
    }
}

impl<'a> IntoIterator for &'a ScanIndex {
    type Item = &'a FileRecord;
    type IntoIter = indexmap::map::Values<'a, PathBuf, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

/// Records are written as a JSON array rather than a path-keyed object.
mod records_as_seq {
    use std::path::PathBuf;

    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::record::FileRecord;

    pub fn serialize<S: Serializer>(
        records: &IndexMap<PathBuf, FileRecord>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(records.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<PathBuf, FileRecord>, D::Error> {
        let records = Vec::<FileRecord>::deserialize(deserializer)?;
        let mut map = IndexMap::with_capacity(records.len());
        for record in records {
            map.entry(record.path.clone()).or_insert(record);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn sample_index() -> ScanIndex {
        let records = vec![
            FileRecord::new("/root/b.txt", 10, SystemTime::UNIX_EPOCH),
            FileRecord::new("/root/a.jpg", 20, SystemTime::UNIX_EPOCH),
            FileRecord::new("/root/b.txt", 99, SystemTime::UNIX_EPOCH),
        ];
        ScanIndex::new(
            PathBuf::from("/root"),
            Utc::now(),
            Duration::ZERO,
            ScanConfig::new("/root"),
            records,
            Vec::new(),
            true,
        )
    }

    #[test]
    fn test_paths_are_unique_first_wins() {
        let index = sample_index();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(Path::new("/root/b.txt")).unwrap().size_bytes, 10);
        assert_eq!(index.total_size(), 30);
    }

    #[test]
    fn test_traversal_order_preserved() {
        let index = sample_index();
        let names: Vec<_> = index.iter().map(|r| r.file_name().to_string()).collect();
        assert_eq!(names, vec!["b.txt", "a.jpg"]);
        assert_eq!(index.position(Path::new("/root/a.jpg")), Some(1));
    }

    #[test]
    fn test_with_hashes_returns_new_index() {
        let index = sample_index();
        let mut hashes = HashMap::new();
        hashes.insert(PathBuf::from("/root/a.jpg"), ContentHash::new([7; 32]));

        let hashed = index.with_hashes(&hashes);
        assert!(index.get(Path::new("/root/a.jpg")).unwrap().content_hash.is_none());
        assert_eq!(
            hashed.get(Path::new("/root/a.jpg")).unwrap().content_hash,
            Some(ContentHash::new([7; 32]))
        );
    }

    #[test]
    fn test_json_records_are_a_list() {
        let index = sample_index();
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json["records"].as_array().unwrap().len(), 2);
        assert_eq!(json["complete"], true);

        let back: ScanIndex = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 2);
    }
}
