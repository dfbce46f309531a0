//! File age bucketing.
//!
//! Ages are measured from a record's modification time to a reference
//! time. Files modified after the reference time count as age zero.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DAY: u64 = 24 * 60 * 60;

/// An age bucket for categorizing files.
///
/// A file belongs to the first bucket whose `max_age` is strictly greater
/// than its age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBucket {
    /// Human-readable name for this bucket.
    pub name: String,
    /// Exclusive upper bound on age for files in this bucket.
    pub max_age: Duration,
}

impl AgeBucket {
    /// Create a new age bucket.
    pub fn new(name: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            max_age,
        }
    }

    /// Standard buckets: under 30 days, 30-90 days, 90-365 days, older.
    pub fn defaults() -> Vec<AgeBucket> {
        vec![
            AgeBucket::new("< 30 days", Duration::from_secs(30 * DAY)),
            AgeBucket::new("30-90 days", Duration::from_secs(90 * DAY)),
            AgeBucket::new("90-365 days", Duration::from_secs(365 * DAY)),
            AgeBucket::new("> 365 days", Duration::MAX),
        ]
    }
}

/// Statistics for an age bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeBucketStats {
    /// Bucket name.
    pub name: String,
    /// Number of files in this bucket.
    pub file_count: u64,
    /// Total size of files in this bucket.
    pub total_size: u64,
}

/// Age of a file at `reference`, clamped to zero for future timestamps.
pub fn age_at(modified_at: DateTime<Utc>, reference: DateTime<Utc>) -> Duration {
    (reference - modified_at).to_std().unwrap_or(Duration::ZERO)
}

/// Accumulates per-bucket counts.
#[derive(Debug, Clone)]
pub(crate) struct AgeHistogram {
    buckets: Vec<AgeBucket>,
    stats: Vec<AgeBucketStats>,
}

impl AgeHistogram {
    pub fn new(buckets: &[AgeBucket]) -> Self {
        let stats = buckets
            .iter()
            .map(|b| AgeBucketStats {
                name: b.name.clone(),
                file_count: 0,
                total_size: 0,
            })
            .collect();
        Self {
            buckets: buckets.to_vec(),
            stats,
        }
    }

    /// Add a file; ages past the last bound land in the last bucket.
    pub fn record(&mut self, age: Duration, size: u64) {
        let Some(last) = self.buckets.len().checked_sub(1) else {
            return;
        };
        let index = self
            .buckets
            .iter()
            .position(|b| age < b.max_age)
            .unwrap_or(last);
        let stats = &mut self.stats[index];
        stats.file_count += 1;
        stats.total_size += size;
    }

    pub fn finish(self) -> Vec<AgeBucketStats> {
        self.stats
    }
}

/// Format a duration as a human-readable age string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < DAY {
        format!("{} hours", secs / 3600)
    } else if secs < 30 * DAY {
        format!("{} days", secs / DAY)
    } else if secs < 365 * DAY {
        format!("{} months", secs / (30 * DAY))
    } else {
        format!("{:.1} years", secs as f64 / (365 * DAY) as f64)
    }
}
