//! Aggregate statistics over a scan index.
//!
//! Summaries are pure functions of a [`ScanIndex`] and an optional
//! [`DuplicateReport`]; no file is touched.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use tidyfile_core::{FileRecord, ScanIndex, TypeCategory};

use crate::age::{age_at, AgeBucket, AgeBucketStats, AgeHistogram};
use crate::duplicates::{DuplicateGroup, DuplicateReport};

/// Configuration for summaries.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct SummaryConfig {
    /// Reference time for ages (default: now).
    #[builder(default = "Utc::now()")]
    pub reference_time: DateTime<Utc>,

    /// Age buckets for the histogram.
    #[builder(default = "AgeBucket::defaults()")]
    pub buckets: Vec<AgeBucket>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            reference_time: Utc::now(),
            buckets: AgeBucket::defaults(),
        }
    }
}

impl SummaryConfig {
    /// Create a new config builder.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder::default()
    }
}

/// Count and size of the files in one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: TypeCategory,
    pub file_count: u64,
    pub total_size: u64,
}

/// A file singled out in a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

impl From<&FileRecord> for FileRef {
    fn from(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            size_bytes: record.size_bytes,
            modified_at: record.modified_at,
        }
    }
}

/// Duplicate sets and totals carried into a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSummary {
    pub group_count: usize,
    pub redundant_files: usize,
    pub wasted_bytes: u64,
    pub hash_errors: usize,
    /// The reported groups, largest waste first.
    pub groups: Vec<DuplicateGroup>,
}

impl From<&DuplicateReport> for DuplicateSummary {
    fn from(report: &DuplicateReport) -> Self {
        Self {
            group_count: report.group_count,
            redundant_files: report.redundant_count(),
            wasted_bytes: report.total_wasted_space,
            hash_errors: report.hash_errors.len(),
            groups: report.groups.clone(),
        }
    }
}

/// Statistics for a scanned tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub root_path: PathBuf,
    /// Time ages were measured against.
    pub reference_time: DateTime<Utc>,
    pub total_files: u64,
    pub total_size: u64,
    /// One entry per category, in declaration order, including empty ones.
    pub categories: Vec<CategoryStats>,
    pub age_buckets: Vec<AgeBucketStats>,
    pub average_age: Duration,
    pub largest_file: Option<FileRef>,
    pub oldest_file: Option<FileRef>,
    pub newest_file: Option<FileRef>,
    /// Present when duplicate detection ran.
    pub duplicates: Option<DuplicateSummary>,
    /// Paths the scan could not read.
    pub skipped_count: usize,
    /// False when the scan was cancelled.
    pub complete: bool,
}

impl AnalysisReport {
    /// Stats for a single category.
    pub fn category(&self, category: TypeCategory) -> Option<&CategoryStats> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Builds [`AnalysisReport`]s.
pub struct Summarizer {
    config: SummaryConfig,
}

impl Summarizer {
    /// Summarizer measuring ages against the current time.
    pub fn new() -> Self {
        Self {
            config: SummaryConfig::default(),
        }
    }

    /// Create a new summarizer with custom config.
    pub fn with_config(config: SummaryConfig) -> Self {
        Self { config }
    }

    /// Summarize `index`, folding in duplicate totals when available.
    pub fn summarize(
        &self,
        index: &ScanIndex,
        duplicates: Option<&DuplicateReport>,
    ) -> AnalysisReport {
        let reference = self.config.reference_time;
        let mut categories: Vec<CategoryStats> = TypeCategory::iter()
            .map(|category| CategoryStats {
                category,
                file_count: 0,
                total_size: 0,
            })
            .collect();
        let mut histogram = AgeHistogram::new(&self.config.buckets);

        let mut total_size = 0u64;
        let mut total_age = Duration::ZERO;
        let mut largest: Option<&FileRecord> = None;
        let mut oldest: Option<&FileRecord> = None;
        let mut newest: Option<&FileRecord> = None;

        for record in index {
            total_size += record.size_bytes;
            let slot = categories.iter_mut().find(|c| c.category == record.type_category);
            if let Some(stats) = slot {
                stats.file_count += 1;
                stats.total_size += record.size_bytes;
            }

            let age = age_at(record.modified_at, reference);
            total_age = total_age.saturating_add(age);
            histogram.record(age, record.size_bytes);

            // Strict comparisons keep the first record in scan order on ties.
            if largest.is_none_or(|l| record.size_bytes > l.size_bytes) {
                largest = Some(record);
            }
            if oldest.is_none_or(|o| record.modified_at < o.modified_at) {
                oldest = Some(record);
            }
            if newest.is_none_or(|n| record.modified_at > n.modified_at) {
                newest = Some(record);
            }
        }

        let total_files = index.len() as u64;
        let average_age = match u32::try_from(total_files) {
            Ok(0) => Duration::ZERO,
            Ok(n) => total_age / n,
            Err(_) => Duration::from_secs(total_age.as_secs() / total_files),
        };

        AnalysisReport {
            root_path: index.root_path().to_path_buf(),
            reference_time: reference,
            total_files,
            total_size,
            categories,
            age_buckets: histogram.finish(),
            average_age,
            largest_file: largest.map(FileRef::from),
            oldest_file: oldest.map(FileRef::from),
            newest_file: newest.map(FileRef::from),
            duplicates: duplicates.map(DuplicateSummary::from),
            skipped_count: index.skipped_paths().len(),
            complete: index.is_complete(),
        }
    }
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarize `index` with ages measured from now.
pub fn summarize(index: &ScanIndex, duplicates: Option<&DuplicateReport>) -> AnalysisReport {
    Summarizer::new().summarize(index, duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    use chrono::TimeZone;
    use tidyfile_core::{ScanConfig, ScanWarning};

    const DAY: u64 = 24 * 60 * 60;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn record(path: &str, size: u64, days_old: u64) -> FileRecord {
        let reference: SystemTime = reference().into();
        FileRecord::new(path, size, reference - Duration::from_secs(days_old * DAY))
    }

    fn index(records: Vec<FileRecord>, skipped: Vec<ScanWarning>) -> ScanIndex {
        ScanIndex::new(
            PathBuf::from("/t"),
            reference(),
            Duration::ZERO,
            ScanConfig::new("/t"),
            records,
            skipped,
            true,
        )
    }

    fn summarizer() -> Summarizer {
        Summarizer::with_config(
            SummaryConfig::builder()
                .reference_time(reference())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_index() {
        let report = summarizer().summarize(&index(Vec::new(), Vec::new()), None);

        assert_eq!(report.total_files, 0);
        assert_eq!(report.categories.len(), 6);
        assert!(report.categories.iter().all(|c| c.file_count == 0));
        assert_eq!(report.age_buckets.len(), 4);
        assert!(report.largest_file.is_none());
        assert_eq!(report.average_age, Duration::ZERO);
        assert!(report.complete);
    }

    #[test]
    fn test_totals_and_extremes() {
        let records = vec![
            record("/t/a.pdf", 100, 10),
            record("/t/b.jpg", 300, 400),
            record("/t/c.jpg", 300, 50),
            record("/t/d.unknown", 5, 0),
        ];
        let skipped = vec![ScanWarning::permission_denied("/t/locked")];
        let report = summarizer().summarize(&index(records, skipped), None);

        assert_eq!(report.total_files, 4);
        assert_eq!(report.total_size, 705);
        assert_eq!(report.category(TypeCategory::Image).unwrap().file_count, 2);
        assert_eq!(report.category(TypeCategory::Image).unwrap().total_size, 600);
        assert_eq!(report.category(TypeCategory::Other).unwrap().file_count, 1);
        assert_eq!(report.category(TypeCategory::Audio).unwrap().file_count, 0);

        assert_eq!(report.largest_file.unwrap().path, PathBuf::from("/t/b.jpg"));
        assert_eq!(report.oldest_file.unwrap().path, PathBuf::from("/t/b.jpg"));
        assert_eq!(report.newest_file.unwrap().path, PathBuf::from("/t/d.unknown"));

        let counts: Vec<_> = report.age_buckets.iter().map(|b| b.file_count).collect();
        assert_eq!(counts, vec![2, 1, 0, 1]);
        assert_eq!(report.skipped_count, 1);
        assert!(report.duplicates.is_none());
    }

    #[test]
    fn test_duplicate_summary_is_carried() {
        let report = summarizer().summarize(
            &index(vec![record("/t/a", 1, 1)], Vec::new()),
            Some(&DuplicateReport::default()),
        );
        let duplicates = report.duplicates.unwrap();
        assert_eq!(duplicates.group_count, 0);
        assert_eq!(duplicates.wasted_bytes, 0);
        assert!(duplicates.groups.is_empty());
    }
}
