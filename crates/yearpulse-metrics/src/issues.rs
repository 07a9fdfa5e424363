//! Issue and pull-request lifecycle aggregation.
//!
//! Opening and closing are counted as independent events: an issue opened
//! in one year and closed in another adds to `new_issues` of the first and
//! to `closed_issues` (and the latency samples) of the second.

use chrono::{DateTime, Datelike, Utc};

use crate::bucket::YearBuckets;

const SECONDS_PER_DAY: i64 = 86_400;

/// Timestamps of one issue or pull request.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use yearpulse_metrics::issues::IssueRecord;
///
/// let issue = IssueRecord {
///     created_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
///     closed_at: Some(Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap()),
/// };
/// assert_eq!(issue.close_latency_days(), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueRecord {
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl IssueRecord {
    /// Whole days from creation to closure, rounded down.
    ///
    /// Negative when the closure predates creation; such values are kept.
    pub fn close_latency_days(&self) -> Option<i64> {
        let closed_at = self.closed_at?;
        let seconds = (closed_at - self.created_at).num_seconds();
        Some(seconds.div_euclid(SECONDS_PER_DAY))
    }
}

/// Fold issue records into `buckets`, returning how many were consumed.
///
/// Records are consumed one at a time, so a paginated source can call this
/// once per page without holding the whole history. Issues from years that
/// the report will later drop are still counted here.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use yearpulse_metrics::bucket::YearBuckets;
/// use yearpulse_metrics::issues::{aggregate_issues, IssueRecord};
///
/// let mut buckets = YearBuckets::new();
/// let open = IssueRecord {
///     created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
///     closed_at: None,
/// };
/// assert_eq!(aggregate_issues(&mut buckets, [open]), 1);
/// assert_eq!(buckets.get(2024).unwrap().new_issues(), 1);
/// assert_eq!(buckets.get(2024).unwrap().closed_issues(), 0);
/// ```
pub fn aggregate_issues<I>(buckets: &mut YearBuckets, issues: I) -> usize
where
    I: IntoIterator<Item = IssueRecord>,
{
    let mut consumed = 0;
    for issue in issues {
        buckets.year_mut(issue.created_at.year()).record_new_issue();

        if let (Some(closed_at), Some(latency)) = (issue.closed_at, issue.close_latency_days()) {
            buckets
                .year_mut(closed_at.year())
                .record_closed_issue(latency);
        }
        consumed += 1;
    }
    consumed
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn same_day_close_has_zero_latency() {
        let issue = IssueRecord {
            created_at: at(2024, 3, 3, 1),
            closed_at: Some(at(2024, 3, 3, 20)),
        };
        assert_eq!(issue.close_latency_days(), Some(0));
    }

    #[test]
    fn partial_days_round_down() {
        let issue = IssueRecord {
            created_at: at(2024, 3, 1, 12),
            closed_at: Some(at(2024, 3, 3, 11)),
        };
        assert_eq!(issue.close_latency_days(), Some(1));
    }

    #[test]
    fn closure_before_creation_is_negative() {
        let issue = IssueRecord {
            created_at: at(2024, 3, 3, 12),
            closed_at: Some(at(2024, 3, 3, 11)),
        };
        assert_eq!(issue.close_latency_days(), Some(-1));
    }

    #[test]
    fn open_issue_has_no_latency() {
        let issue = IssueRecord {
            created_at: at(2024, 3, 3, 12),
            closed_at: None,
        };
        assert_eq!(issue.close_latency_days(), None);
    }

    #[test]
    fn cross_year_issue_splits_events() {
        let mut buckets = YearBuckets::new();
        let issue = IssueRecord {
            created_at: at(2022, 12, 20, 0),
            closed_at: Some(at(2023, 1, 9, 0)),
        };
        aggregate_issues(&mut buckets, [issue]);

        let y2022 = buckets.get(2022).unwrap();
        assert_eq!(y2022.new_issues(), 1);
        assert_eq!(y2022.closed_issues(), 0);
        assert!(y2022.close_latencies().is_empty());

        let y2023 = buckets.get(2023).unwrap();
        assert_eq!(y2023.new_issues(), 0);
        assert_eq!(y2023.closed_issues(), 1);
        assert_eq!(y2023.close_latencies(), &[20]);
    }

    #[test]
    fn closure_year_before_creation_year_still_counts_under_closure() {
        let mut buckets = YearBuckets::new();
        let issue = IssueRecord {
            created_at: at(2024, 1, 1, 0),
            closed_at: Some(at(2023, 12, 31, 0)),
        };
        aggregate_issues(&mut buckets, [issue]);
        assert_eq!(buckets.get(2024).unwrap().new_issues(), 1);
        assert_eq!(buckets.get(2023).unwrap().closed_issues(), 1);
        assert_eq!(buckets.get(2023).unwrap().close_latencies(), &[-1]);
    }

    #[test]
    fn pages_can_be_fed_incrementally() {
        let mut buckets = YearBuckets::new();
        let page = |n: u32| {
            (0..n).map(|i| IssueRecord {
                created_at: at(2024, 1, 1 + i, 0),
                closed_at: None,
            })
        };
        assert_eq!(aggregate_issues(&mut buckets, page(3)), 3);
        assert_eq!(aggregate_issues(&mut buckets, page(2)), 2);
        assert_eq!(buckets.get(2024).unwrap().new_issues(), 5);
    }
}
