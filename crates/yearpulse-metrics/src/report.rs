//! Yearly summaries, console rendering, and the JSON export.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use yearpulse_core::PulseError;

use crate::bucket::{YearBucket, YearBuckets};
use crate::concentration::majority_cover;

/// Minimum commits in a year for an author to count as active.
pub const ACTIVE_CONTRIBUTOR_THRESHOLD: u32 = 10;

/// Metrics for one calendar year.
///
/// Field names follow the export document consumed by the dashboard.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::bucket::YearBucket;
/// use yearpulse_metrics::report::YearlySummary;
///
/// let mut bucket = YearBucket::default();
/// for _ in 0..6 {
///     bucket.record_commit("A", Some("co.com"));
/// }
/// for _ in 0..4 {
///     bucket.record_commit("B", Some("co.com"));
/// }
/// let summary = YearlySummary::from_bucket(&bucket);
/// assert_eq!(summary.bus_factor, 1);
/// assert_eq!(summary.org_count, 1);
/// assert_eq!(summary.elephant_factor, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    pub total_commits: u32,
    /// Distinct author names.
    pub contrib_total: u32,
    /// Authors with at least [`ACTIVE_CONTRIBUTOR_THRESHOLD`] commits.
    #[serde(rename = "contrib_active_n10")]
    pub contrib_active: u32,
    #[serde(rename = "bus_factor_caf")]
    pub bus_factor: u32,
    pub org_count: u32,
    pub elephant_factor: u32,
    #[serde(rename = "issues_new")]
    pub new_issues: u32,
    #[serde(rename = "issues_closed")]
    pub closed_issues: u32,
    /// Mean close latency in days, `0.0` when nothing closed.
    #[serde(serialize_with = "two_decimals")]
    pub avg_days_to_close: f64,
}

impl YearlySummary {
    /// Derive the summary of one year's raw counts.
    pub fn from_bucket(bucket: &YearBucket) -> Self {
        let authors = bucket.commits_by_author();
        let orgs = bucket.commits_by_org();

        let bus_factor = majority_cover(authors.values().copied());
        // No organizational commits at all is one anonymous organization.
        let elephant_factor = match majority_cover(orgs.values().copied()) {
            0 => 1,
            k => k,
        };

        Self {
            total_commits: bucket.total_commits(),
            contrib_total: authors.len() as u32,
            contrib_active: authors
                .values()
                .filter(|c| **c >= ACTIVE_CONTRIBUTOR_THRESHOLD)
                .count() as u32,
            bus_factor,
            org_count: orgs.len() as u32,
            elephant_factor,
            new_issues: bucket.new_issues(),
            closed_issues: bucket.closed_issues(),
            avg_days_to_close: mean(bucket.close_latencies()),
        }
    }
}

fn mean(samples: &[i64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| *s as f64).sum::<f64>() / samples.len() as f64
}

/// Two decimals, ties to even, so `0.125` becomes `0.12`.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// The per-project report, and the document persisted for it.
///
/// Year keys are written as JSON strings and read back as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// `owner/name` of the analyzed project.
    pub project: String,
    pub generated_at: DateTime<FixedOffset>,
    pub start_year_requested: i32,
    /// Summaries in ascending year order.
    pub metrics: BTreeMap<i32, YearlySummary>,
}

impl Report {
    /// Summarize every bucket from `start_year` on.
    ///
    /// Earlier years may have been accumulated because the sources filter
    /// by update time rather than creation time; they are dropped here.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{FixedOffset, TimeZone};
    /// use yearpulse_metrics::bucket::YearBuckets;
    /// use yearpulse_metrics::report::Report;
    ///
    /// let mut buckets = YearBuckets::new();
    /// buckets.year_mut(2021).record_new_issue();
    /// buckets.year_mut(2024).record_new_issue();
    ///
    /// let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    /// let report = Report::build("octocat/hello", 2023, &buckets, now);
    /// assert_eq!(report.metrics.keys().copied().collect::<Vec<_>>(), vec![2024]);
    /// ```
    pub fn build(
        project: &str,
        start_year: i32,
        buckets: &YearBuckets,
        generated_at: DateTime<FixedOffset>,
    ) -> Self {
        let metrics = buckets
            .iter()
            .filter(|(year, _)| *year >= start_year)
            .map(|(year, bucket)| (year, YearlySummary::from_bucket(bucket)))
            .collect();

        Self {
            project: project.to_string(),
            generated_at,
            start_year_requested: start_year,
            metrics,
        }
    }

    /// Pretty-printed export document.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, PulseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the export to `path`, replacing any previous run's file.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Io`] if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PulseError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read an export previously written by [`Report::save`].
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::FileNotFound`] if `path` does not exist, or
    /// [`PulseError::Serialization`] if it is not a report document.
    pub fn load(path: &Path) -> Result<Self, PulseError> {
        if !path.exists() {
            return Err(PulseError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Render the summaries as a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# Community health: {}\n\n**Since:** {}  \n**Generated:** {}\n\n",
            self.project,
            self.start_year_requested,
            self.generated_at.to_rfc3339()
        );
        if self.metrics.is_empty() {
            out.push_str("No activity recorded.\n");
            return out;
        }
        out.push_str("| Year | Commits | Contributors | Active | Bus factor | Orgs | Elephant | New issues | Closed issues | Avg days to close |\n");
        out.push_str("|------|---------|--------------|--------|------------|------|----------|------------|---------------|-------------------|\n");
        for (year, s) in &self.metrics {
            out.push_str(&format!(
                "| {year} | {} | {} | {} | {} | {} | {} | {} | {} | {:.1} |\n",
                s.total_commits,
                s.contrib_total,
                s.contrib_active,
                s.bus_factor,
                s.org_count,
                s.elephant_factor,
                s.new_issues,
                s.closed_issues,
                s.avg_days_to_close,
            ));
        }
        out
    }
}

const TABLE_HEADER: &str = "Year  | Commits | Total | Active | CAF | Orgs | Elephant | NewIss  | ClsIss  | AvgDaysToCls";

impl fmt::Display for Report {
    /// Fixed-width console table, one row per year.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule_len = TABLE_HEADER.len();
        writeln!(f, "{}", "=".repeat(rule_len))?;
        writeln!(f, "{TABLE_HEADER}")?;
        writeln!(f, "{}", "-".repeat(rule_len))?;
        for (year, s) in &self.metrics {
            writeln!(
                f,
                "{:<5} | {:<7} | {:<5} | {:<6} | {:<3} | {:<4} | {:<8} | {:<7} | {:<7} | {:<12.1}",
                year,
                s.total_commits,
                s.contrib_total,
                s.contrib_active,
                s.bus_factor,
                s.org_count,
                s.elephant_factor,
                s.new_issues,
                s.closed_issues,
                s.avg_days_to_close,
            )?;
        }
        writeln!(f, "{}", "-".repeat(rule_len))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn generated() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
            .unwrap()
    }

    fn bucket_with(authors: &[(&str, Option<&str>, u32)]) -> YearBucket {
        let mut bucket = YearBucket::default();
        for (name, org, n) in authors {
            for _ in 0..*n {
                bucket.record_commit(name, *org);
            }
        }
        bucket
    }

    #[test]
    fn empty_bucket_summary() {
        let summary = YearlySummary::from_bucket(&YearBucket::default());
        assert_eq!(summary.total_commits, 0);
        assert_eq!(summary.bus_factor, 0);
        assert_eq!(summary.org_count, 0);
        assert_eq!(summary.elephant_factor, 1);
        assert_eq!(summary.avg_days_to_close, 0.0);
    }

    #[test]
    fn tied_authors_need_only_one() {
        let bucket = bucket_with(&[("A", None, 5), ("B", None, 5)]);
        assert_eq!(YearlySummary::from_bucket(&bucket).bus_factor, 1);
    }

    #[test]
    fn commits_without_orgs_give_elephant_one() {
        let bucket = bucket_with(&[("A", None, 3), ("B", None, 3), ("C", None, 3)]);
        let summary = YearlySummary::from_bucket(&bucket);
        assert_eq!(summary.bus_factor, 2);
        assert_eq!(summary.org_count, 0);
        assert_eq!(summary.elephant_factor, 1);
    }

    #[test]
    fn elephant_factor_uses_org_distribution() {
        let bucket = bucket_with(&[
            ("A", Some("a.com"), 4),
            ("B", Some("b.com"), 4),
            ("C", Some("c.com"), 4),
            ("D", None, 20),
        ]);
        let summary = YearlySummary::from_bucket(&bucket);
        assert_eq!(summary.bus_factor, 1);
        assert_eq!(summary.org_count, 3);
        assert_eq!(summary.elephant_factor, 2);
    }

    #[test]
    fn active_contributors_use_threshold() {
        let bucket = bucket_with(&[("A", None, 10), ("B", None, 9), ("C", None, 25)]);
        let summary = YearlySummary::from_bucket(&bucket);
        assert_eq!(summary.contrib_total, 3);
        assert_eq!(summary.contrib_active, 2);
    }

    #[test]
    fn average_close_latency() {
        let mut bucket = YearBucket::default();
        bucket.record_closed_issue(1);
        bucket.record_closed_issue(2);
        bucket.record_closed_issue(2);
        let summary = YearlySummary::from_bucket(&bucket);
        assert!((summary.avg_days_to_close - 5.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn years_before_start_are_dropped() {
        let mut buckets = YearBuckets::new();
        for year in [2019, 2023, 2024, 2025] {
            buckets.year_mut(year).record_commit("A", None);
        }
        let report = Report::build("o/r", 2024, &buckets, generated());
        assert_eq!(
            report.metrics.keys().copied().collect::<Vec<_>>(),
            vec![2024, 2025]
        );
        let table = report.to_string();
        assert!(!table.contains("2019"));
        assert!(!table.contains("2023"));
    }

    #[test]
    fn export_uses_document_field_names() {
        let mut buckets = YearBuckets::new();
        buckets.year_mut(2024).record_closed_issue(1);
        buckets.year_mut(2024).record_closed_issue(0);
        buckets.year_mut(2024).record_closed_issue(0);
        let report = Report::build("o/r", 2024, &buckets, generated());

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["project"], "o/r");
        assert_eq!(value["start_year_requested"], 2024);
        let year = &value["metrics"]["2024"];
        assert_eq!(year["contrib_active_n10"], 0);
        assert_eq!(year["bus_factor_caf"], 0);
        assert_eq!(year["elephant_factor"], 1);
        assert_eq!(year["issues_closed"], 3);
        assert_eq!(year["avg_days_to_close"], 0.33);
    }

    #[test]
    fn exported_average_rounds_ties_to_even() {
        let mut buckets = YearBuckets::new();
        for days in [1, 0, 0, 0, 0, 0, 0, 0] {
            buckets.year_mut(2024).record_closed_issue(days);
        }
        for days in [3, 3, 2, 2, 2, 3, 2, 2] {
            buckets.year_mut(2025).record_closed_issue(days);
        }
        let report = Report::build("o/r", 2024, &buckets, generated());
        assert_eq!(report.metrics[&2024].avg_days_to_close, 0.125);
        assert_eq!(report.metrics[&2025].avg_days_to_close, 2.375);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["metrics"]["2024"]["avg_days_to_close"], 0.12);
        assert_eq!(value["metrics"]["2025"]["avg_days_to_close"], 2.38);
    }

    #[test]
    fn save_then_load_keeps_years() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/o_r_final_report.json");

        let mut buckets = YearBuckets::new();
        buckets.year_mut(2024).record_commit("A", Some("co.com"));
        buckets.year_mut(2025).record_new_issue();
        let report = Report::build("o/r", 2024, &buckets, generated());
        report.save(&path).unwrap();

        let loaded = Report::load(&path).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.metrics[&2024].org_count, 1);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = Report::load(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(matches!(err, PulseError::FileNotFound(_)));
    }

    #[test]
    fn table_has_one_row_per_year() {
        let mut buckets = YearBuckets::new();
        buckets.year_mut(2024).record_commit("A", None);
        buckets.year_mut(2025).record_commit("A", None);
        let table = Report::build("o/r", 2024, &buckets, generated()).to_string();
        let rows: Vec<&str> = table.lines().filter(|l| l.starts_with("202")).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("2024  | 1 "));
        assert!(table.contains("AvgDaysToCls"));
    }

    #[test]
    fn markdown_lists_years() {
        let mut buckets = YearBuckets::new();
        buckets.year_mut(2024).record_commit("A", None);
        let md = Report::build("o/r", 2024, &buckets, generated()).to_markdown();
        assert!(md.contains("# Community health: o/r"));
        assert!(md.contains("| 2024 | 1 | 1 | 0 | 1 | 0 | 1 | 0 | 0 | 0.0 |"));
    }
}
