//! Per-year accumulators.

use std::collections::{BTreeMap, HashMap};

/// Raw counts observed for one calendar year.
///
/// Created on first observation of its year and filled by the commit and
/// issue aggregators. `total_commits` always equals the sum of the
/// per-author counts.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::bucket::YearBucket;
///
/// let mut bucket = YearBucket::default();
/// bucket.record_commit("alice", Some("example.com"));
/// bucket.record_commit("alice", None);
/// assert_eq!(bucket.total_commits(), 2);
/// assert_eq!(bucket.commits_by_author()["alice"], 2);
/// assert_eq!(bucket.commits_by_org()["example.com"], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearBucket {
    total_commits: u32,
    commits_by_author: HashMap<String, u32>,
    commits_by_org: HashMap<String, u32>,
    new_issues: u32,
    closed_issues: u32,
    close_latencies: Vec<i64>,
}

impl YearBucket {
    /// Count one commit by `author`, attributed to `org` when known.
    pub fn record_commit(&mut self, author: &str, org: Option<&str>) {
        self.total_commits += 1;
        increment(&mut self.commits_by_author, author);
        if let Some(org) = org {
            increment(&mut self.commits_by_org, org);
        }
    }

    /// Count one issue opened this year.
    pub fn record_new_issue(&mut self) {
        self.new_issues += 1;
    }

    /// Count one issue closed this year, `latency_days` after it was opened.
    pub fn record_closed_issue(&mut self, latency_days: i64) {
        self.closed_issues += 1;
        self.close_latencies.push(latency_days);
    }

    pub fn total_commits(&self) -> u32 {
        self.total_commits
    }

    pub fn commits_by_author(&self) -> &HashMap<String, u32> {
        &self.commits_by_author
    }

    pub fn commits_by_org(&self) -> &HashMap<String, u32> {
        &self.commits_by_org
    }

    pub fn new_issues(&self) -> u32 {
        self.new_issues
    }

    pub fn closed_issues(&self) -> u32 {
        self.closed_issues
    }

    /// Close latencies in days, in the order the issues were processed.
    pub fn close_latencies(&self) -> &[i64] {
        &self.close_latencies
    }
}

// First touch inserts an explicit zero, then every touch adds one.
fn increment(counts: &mut HashMap<String, u32>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

/// All year buckets of one run, keyed by calendar year.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::bucket::YearBuckets;
///
/// let mut buckets = YearBuckets::new();
/// buckets.year_mut(2024).record_new_issue();
/// buckets.year_mut(2022).record_new_issue();
///
/// let years: Vec<i32> = buckets.iter().map(|(year, _)| year).collect();
/// assert_eq!(years, vec![2022, 2024]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct YearBuckets {
    years: BTreeMap<i32, YearBucket>,
}

impl YearBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket for `year`, created empty on first access.
    pub fn year_mut(&mut self, year: i32) -> &mut YearBucket {
        self.years.entry(year).or_insert_with(YearBucket::default)
    }

    pub fn get(&self, year: i32) -> Option<&YearBucket> {
        self.years.get(&year)
    }

    /// Buckets in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &YearBucket)> {
        self.years.iter().map(|(year, bucket)| (*year, bucket))
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
