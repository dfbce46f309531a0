//! Duplicate file detection using content hashing.
//!
//! Uses a three-phase algorithm for efficiency:
//! 1. Group files by size (sort, O(n log n)); unique sizes are never read
//! 2. Optionally compute a partial hash (head + tail + length) per size bucket
//! 3. Compute the full content hash for the remaining candidates
//!
//! Only files whose full digests match end up in the same group.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tidyfile_core::{ContentHash, FileRecord, ScanIndex};

use crate::hasher::{ContentHasher, DEFAULT_CHUNK_SIZE, HashAlgorithm, HashError};

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct DuplicateConfig {
    /// Minimum file size to consider. Empty files are grouped too unless
    /// this is raised above zero.
    #[builder(default = "0")]
    pub min_size: u64,

    /// Maximum file size to consider.
    #[builder(default = "u64::MAX")]
    pub max_size: u64,

    /// Compare a partial hash before reading whole files.
    #[builder(default = "true")]
    pub quick_compare: bool,

    /// Number of bytes for partial hash from start of file.
    #[builder(default = "4096")]
    pub partial_hash_head: usize,

    /// Number of bytes for partial hash from end of file.
    #[builder(default = "4096")]
    pub partial_hash_tail: usize,

    /// Glob patterns (matched against file name and full path) to ignore.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,

    /// Maximum number of groups to return (0 = unlimited).
    #[builder(default = "0")]
    pub max_groups: usize,

    /// Digest used for content hashes.
    #[builder(default)]
    pub algorithm: HashAlgorithm,

    /// Read chunk size for full hashes.
    #[builder(default = "DEFAULT_CHUNK_SIZE")]
    pub chunk_size: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_size: u64::MAX,
            quick_compare: true,
            partial_hash_head: 4096,
            partial_hash_tail: 4096,
            exclude_patterns: Vec::new(),
            max_groups: 0,
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DuplicateConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_size, self.max_size) {
            if min > max {
                return Err(format!("min_size ({min}) exceeds max_size ({max})"));
            }
        }
        if let Some(ref patterns) = self.exclude_patterns {
            for pattern in patterns {
                Glob::new(pattern)
                    .map_err(|e| format!("Invalid exclude pattern {pattern:?}: {e}"))?;
            }
        }
        Ok(())
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }

    fn exclude_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern = %pattern, error = %e, "ignoring invalid exclude pattern"),
            }
        }
        builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "failed to compile exclude patterns");
            GlobSet::empty()
        })
    }
}

/// A group of files with byte-identical content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all files in this group.
    pub content_hash: ContentHash,

    /// Size of each file in bytes.
    pub size_bytes: u64,

    /// Member paths in scan order.
    pub members: Vec<PathBuf>,

    /// The member to retain: earliest modification time, then smallest path.
    pub keeper: PathBuf,

    /// Wasted space: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Number of files in the group.
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Members other than the keeper.
    pub fn redundant(&self) -> impl Iterator<Item = &Path> {
        self.members
            .iter()
            .filter(move |p| **p != self.keeper)
            .map(PathBuf::as_path)
    }
}

/// A file excluded from detection because it could not be hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashFailure {
    pub path: PathBuf,
    pub message: String,
}

impl From<HashError> for HashFailure {
    fn from(err: HashError) -> Self {
        Self {
            path: err.path().to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups of duplicate files, sorted by wasted space descending.
    pub groups: Vec<DuplicateGroup>,

    /// Files that could not be read while hashing.
    pub hash_errors: Vec<HashFailure>,

    /// Digest used for the groups.
    pub algorithm: HashAlgorithm,

    /// Total size of all duplicate files.
    pub total_duplicate_size: u64,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of files that passed the size and pattern filters.
    pub files_analyzed: u64,

    /// Number of files fully hashed.
    pub files_hashed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of duplicate groups.
    pub group_count: usize,

    #[serde(skip)]
    hashes: HashMap<PathBuf, ContentHash>,

    /// Non-keeper members of groups dropped by `max_groups`.
    #[serde(skip)]
    unreported_redundant: Vec<PathBuf>,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Number of files that would remain redundant after keeping one per group.
    pub fn redundant_count(&self) -> usize {
        self.groups.iter().map(|g| g.count().saturating_sub(1)).sum()
    }

    /// Every non-keeper member across all groups, including groups left out
    /// of the report by `max_groups`.
    pub fn redundant_paths(&self) -> HashSet<&Path> {
        self.groups
            .iter()
            .flat_map(DuplicateGroup::redundant)
            .chain(self.unreported_redundant.iter().map(PathBuf::as_path))
            .collect()
    }

    /// Full digests computed during detection, keyed by path.
    pub fn hashes(&self) -> &HashMap<PathBuf, ContentHash> {
        &self.hashes
    }

    /// A copy of `index` whose records carry the digests computed here.
    pub fn annotate(&self, index: &ScanIndex) -> ScanIndex {
        index.with_hashes(&self.hashes)
    }
}

/// What one size bucket produced.
#[derive(Default)]
struct BucketOutcome {
    groups: Vec<DuplicateGroup>,
    hashes: Vec<(PathBuf, ContentHash)>,
    errors: Vec<HashFailure>,
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
    hasher: ContentHasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self::with_config(DuplicateConfig::default())
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        let hasher = ContentHasher::with_algorithm(config.algorithm).chunk_size(config.chunk_size);
        Self { config, hasher }
    }

    /// Find groups of identical files in a scan index.
    ///
    /// Files that cannot be read are left out of every group and listed in
    /// [`DuplicateReport::hash_errors`].
    pub fn find_duplicates(&self, index: &ScanIndex) -> DuplicateReport {
        let excludes = self.config.exclude_set();

        let mut candidates: Vec<&FileRecord> = index
            .iter()
            .filter(|r| (self.config.min_size..=self.config.max_size).contains(&r.size_bytes))
            .filter(|r| !excludes.is_match(r.file_name()) && !excludes.is_match(&r.path))
            .collect();
        let files_analyzed = candidates.len() as u64;

        // Stable sort keeps scan order inside each size bucket.
        candidates.sort_by_key(|r| r.size_bytes);
        let buckets: Vec<&[&FileRecord]> = candidates
            .chunk_by(|a, b| a.size_bytes == b.size_bytes)
            .filter(|bucket| bucket.len() > 1)
            .collect();

        debug!(
            files = files_analyzed,
            buckets = buckets.len(),
            "size grouping finished"
        );

        let outcomes: Vec<BucketOutcome> = buckets
            .into_par_iter()
            .map(|bucket| self.process_bucket(bucket))
            .collect();

        let mut groups = Vec::new();
        let mut hash_errors = Vec::new();
        let mut hashes = HashMap::new();
        for outcome in outcomes {
            groups.extend(outcome.groups);
            hash_errors.extend(outcome.errors);
            hashes.extend(outcome.hashes);
        }

        groups.sort_by(|a, b| {
            b.wasted_bytes
                .cmp(&a.wasted_bytes)
                .then_with(|| a.keeper.as_os_str().cmp(b.keeper.as_os_str()))
        });
        let mut unreported_redundant = Vec::new();
        if self.config.max_groups > 0 && groups.len() > self.config.max_groups {
            for group in groups.drain(self.config.max_groups..) {
                unreported_redundant.extend(group.redundant().map(Path::to_path_buf));
            }
        }
        hash_errors.sort_by(|a, b| a.path.cmp(&b.path));

        let total_duplicate_size = groups.iter().map(|g| g.size_bytes * g.count() as u64).sum();
        let total_wasted_space = groups.iter().map(|g| g.wasted_bytes).sum();
        let files_with_duplicates = groups.iter().map(|g| g.count() as u64).sum();
        let group_count = groups.len();

        info!(
            groups = group_count,
            wasted_bytes = total_wasted_space,
            hashed = hashes.len(),
            errors = hash_errors.len(),
            "duplicate detection finished"
        );

        DuplicateReport {
            groups,
            hash_errors,
            algorithm: self.config.algorithm,
            total_duplicate_size,
            total_wasted_space,
            files_analyzed,
            files_hashed: hashes.len() as u64,
            files_with_duplicates,
            group_count,
            hashes,
            unreported_redundant,
        }
    }

    /// Hash the files of one size bucket and group them by digest.
    fn process_bucket(&self, bucket: &[&FileRecord]) -> BucketOutcome {
        let mut outcome = BucketOutcome::default();
        let size = bucket[0].size_bytes;
        let head = self.config.partial_hash_head;
        let tail = self.config.partial_hash_tail;

        // A partial hash over the whole file saves nothing.
        let survivors: Vec<&FileRecord> = if self.config.quick_compare
            && size > (head + tail) as u64
        {
            let partials: Vec<_> = bucket
                .par_iter()
                .map(|r| (*r, self.hasher.partial_hash(&r.path, head, tail)))
                .collect();
            self.sort_results(partials, &mut outcome.errors)
                .into_iter()
                .flat_map(|(_, members)| members)
                .collect()
        } else {
            bucket.to_vec()
        };

        if survivors.len() < 2 {
            return outcome;
        }

        let fulls: Vec<_> = survivors
            .par_iter()
            .map(|r| (*r, self.hasher.hash(&r.path)))
            .collect();
        for (record, result) in &fulls {
            if let Ok(hash) = result {
                outcome.hashes.push((record.path.clone(), *hash));
            }
        }

        for (hash, members) in self.sort_results(fulls, &mut outcome.errors) {
            outcome.groups.push(build_group(hash, size, &members));
        }

        outcome
    }

    /// Split hashing results into digest groups of two or more, in input
    /// order, and collect failures.
    fn sort_results<'a>(
        &self,
        results: Vec<(&'a FileRecord, Result<ContentHash, HashError>)>,
        errors: &mut Vec<HashFailure>,
    ) -> Vec<(ContentHash, Vec<&'a FileRecord>)> {
        let mut order: Vec<ContentHash> = Vec::new();
        let mut by_hash: HashMap<ContentHash, Vec<&FileRecord>> = HashMap::new();

        for (record, result) in results {
            match result {
                Ok(hash) => {
                    let entry = by_hash.entry(hash).or_default();
                    if entry.is_empty() {
                        order.push(hash);
                    }
                    entry.push(record);
                }
                Err(err) => {
                    warn!(path = %record.path.display(), error = %err, "excluding unreadable file");
                    errors.push(err.into());
                }
            }
        }

        order
            .into_iter()
            .filter_map(|hash| by_hash.remove(&hash).map(|members| (hash, members)))
            .filter(|(_, members)| members.len() > 1)
            .collect()
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Earliest modification time wins; ties go to the smallest path string.
fn pick_keeper<'a>(members: &[&'a FileRecord]) -> Option<&'a FileRecord> {
    members.iter().copied().min_by(|a, b| {
        a.modified_at
            .cmp(&b.modified_at)
            .then_with(|| a.path.as_os_str().cmp(b.path.as_os_str()))
    })
}

fn build_group(
    content_hash: ContentHash,
    size_bytes: u64,
    members: &[&FileRecord],
) -> DuplicateGroup {
    let keeper = pick_keeper(members)
        .map(|r| r.path.clone())
        .unwrap_or_default();
    DuplicateGroup {
        content_hash,
        size_bytes,
        members: members.iter().map(|r| r.path.clone()).collect(),
        keeper,
        wasted_bytes: size_bytes * (members.len() as u64 - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn record(path: &str, secs: u64) -> FileRecord {
        FileRecord::new(path, 10, SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    #[test]
    fn test_keeper_earliest_mtime() {
        let a = record("/t/a.txt", 200);
        let b = record("/t/b.txt", 100);
        assert_eq!(pick_keeper(&[&a, &b]).unwrap().path, PathBuf::from("/t/b.txt"));
    }

    #[test]
    fn test_keeper_tie_uses_path_string() {
        // Byte-wise "/t/a-b" < "/t/a/b" because '-' sorts before '/'.
        let nested = record("/t/a/b", 100);
        let dashed = record("/t/a-b", 100);
        assert_eq!(
            pick_keeper(&[&nested, &dashed]).unwrap().path,
            PathBuf::from("/t/a-b")
        );
    }

    #[test]
    fn test_group_redundant_members() {
        let a = record("/t/a", 300);
        let b = record("/t/b", 100);
        let c = record("/t/c", 200);
        let group = build_group(ContentHash::new([1; 32]), 10, &[&a, &b, &c]);

        assert_eq!(group.count(), 3);
        assert_eq!(group.keeper, PathBuf::from("/t/b"));
        assert_eq!(group.wasted_bytes, 20);
        let redundant: Vec<_> = group.redundant().collect();
        assert_eq!(redundant, vec![Path::new("/t/a"), Path::new("/t/c")]);
    }

    #[test]
    fn test_config_defaults() {
        let built = DuplicateConfig::builder().build().unwrap();
        let default = DuplicateConfig::default();
        assert_eq!(built.min_size, default.min_size);
        assert_eq!(built.min_size, 0);
        assert!(built.quick_compare);
        assert_eq!(built.algorithm, HashAlgorithm::Sha256);
        assert_eq!(built.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_config_validation() {
        assert!(DuplicateConfig::builder()
            .min_size(10u64)
            .max_size(5u64)
            .build()
            .is_err());
        assert!(DuplicateConfig::builder()
            .exclude_patterns(vec!["[".to_string()])
            .build()
            .is_err());
    }
}
