//! Commit log parsing and per-year commit aggregation.
//!
//! Input lines come from `git log --pretty=format:%aI|%aN|%aE`. Author names
//! may themselves contain `|`, so lines are split from the right.

use crate::bucket::YearBuckets;
use crate::identity::OrgResolver;

/// One commit parsed from a log line.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::commits::CommitRecord;
///
/// let record = CommitRecord::parse_line("2024-03-01T10:00:00+09:00|Alice|alice@co.com").unwrap();
/// assert_eq!(record.year, 2024);
/// assert_eq!(record.author, "Alice");
/// assert_eq!(record.email, "alice@co.com");
///
/// assert!(CommitRecord::parse_line("2024-03-01|no-email").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// Author timestamp as printed by git.
    pub timestamp: String,
    /// Calendar year taken from the timestamp.
    pub year: i32,
    /// Author display name.
    pub author: String,
    /// Author e-mail address.
    pub email: String,
}

impl CommitRecord {
    /// Parse `timestamp|name|email`.
    ///
    /// The last two `|`-separated fields are the e-mail and name; the
    /// remainder is the timestamp. Returns `None` for blank lines, lines with
    /// fewer than two separators, and timestamps that do not start with a
    /// four-digit year.
    pub fn parse_line(line: &str) -> Option<Self> {
        if line.is_empty() {
            return None;
        }
        let mut fields = line.rsplitn(3, '|');
        let email = fields.next()?;
        let author = fields.next()?;
        let timestamp = fields.next()?;
        let year = leading_year(timestamp)?;

        Some(Self {
            timestamp: timestamp.to_string(),
            year,
            author: author.to_string(),
            email: email.to_string(),
        })
    }
}

fn leading_year(timestamp: &str) -> Option<i32> {
    let digits = timestamp.get(..4)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Fold commit log lines into `buckets`.
///
/// Each valid line adds one commit to its year: to the total, to the
/// author's count, and to the author's organization when `orgs` resolves
/// one. Malformed lines are skipped without error. Returns the number of
/// commits counted.
///
/// Lines are consumed lazily, one at a time. Feeding the same line twice
/// counts it twice.
///
/// # Examples
///
/// ```
/// use yearpulse_metrics::bucket::YearBuckets;
/// use yearpulse_metrics::commits::aggregate_commits;
/// use yearpulse_metrics::identity::OrgResolver;
///
/// let mut buckets = YearBuckets::new();
/// let lines = ["2024-01-02T00:00:00Z|A|a@co.com", "", "garbage"];
/// let counted = aggregate_commits(&mut buckets, &OrgResolver::default(), lines);
/// assert_eq!(counted, 1);
/// assert_eq!(buckets.get(2024).unwrap().total_commits(), 1);
/// ```
pub fn aggregate_commits<I>(buckets: &mut YearBuckets, orgs: &OrgResolver, lines: I) -> usize
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut counted = 0;
    for line in lines {
        let Some(record) = CommitRecord::parse_line(line.as_ref()) else {
            continue;
        };
        let org = orgs.organization(&record.email);
        buckets
            .year_mut(record.year)
            .record_commit(&record.author, org.as_deref());
        counted += 1;
    }
    counted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_in_name_stays_out_of_email_and_name() {
        let record = CommitRecord::parse_line("2023-05-05T00:00:00Z|A|B|ab@co.com").unwrap();
        assert_eq!(record.email, "ab@co.com");
        assert_eq!(record.author, "B");
        assert_eq!(record.timestamp, "2023-05-05T00:00:00Z|A");
        assert_eq!(record.year, 2023);
    }

    #[test]
    fn short_lines_are_rejected() {
        assert!(CommitRecord::parse_line("").is_none());
        assert!(CommitRecord::parse_line("2024-01-01").is_none());
        assert!(CommitRecord::parse_line("2024-01-01|a@co.com").is_none());
    }

    #[test]
    fn non_year_timestamp_is_rejected() {
        assert!(CommitRecord::parse_line("abcd-01-01|A|a@co.com").is_none());
        assert!(CommitRecord::parse_line("24|A|a@co.com").is_none());
    }

    #[test]
    fn empty_name_and_email_are_still_commits() {
        let record = CommitRecord::parse_line("2024-01-01T00:00:00Z||").unwrap();
        assert_eq!(record.author, "");
        assert_eq!(record.email, "");
    }

    #[test]
    fn commits_land_in_their_own_year() {
        let mut buckets = YearBuckets::new();
        let lines = vec![
            "2022-12-31T23:59:59Z|A|a@co.com".to_string(),
            "2023-01-01T00:00:00Z|A|a@co.com".to_string(),
            "2023-06-01T00:00:00Z|B|b@gmail.com".to_string(),
        ];
        let counted = aggregate_commits(&mut buckets, &OrgResolver::default(), &lines);
        assert_eq!(counted, 3);

        let y2022 = buckets.get(2022).unwrap();
        assert_eq!(y2022.total_commits(), 1);

        let y2023 = buckets.get(2023).unwrap();
        assert_eq!(y2023.total_commits(), 2);
        assert_eq!(y2023.commits_by_author().len(), 2);
        assert_eq!(y2023.commits_by_org().len(), 1);
        assert_eq!(y2023.commits_by_org()["co.com"], 1);
    }

    #[test]
    fn malformed_lines_touch_no_year() {
        let mut buckets = YearBuckets::new();
        let counted = aggregate_commits(
            &mut buckets,
            &OrgResolver::default(),
            ["2024-01-01|only-one-separator", "   ", ""],
        );
        assert_eq!(counted, 0);
        assert!(buckets.is_empty());
    }

    #[test]
    fn repeated_calls_accumulate() {
        let mut buckets = YearBuckets::new();
        let orgs = OrgResolver::default();
        aggregate_commits(&mut buckets, &orgs, ["2021-01-01T00:00:00Z|A|a@x.org"]);
        aggregate_commits(&mut buckets, &orgs, ["2022-01-01T00:00:00Z|A|a@x.org"]);
        aggregate_commits(&mut buckets, &orgs, ["2022-02-01T00:00:00Z|A|a@x.org"]);
        assert_eq!(buckets.get(2021).unwrap().total_commits(), 1);
        assert_eq!(buckets.get(2022).unwrap().total_commits(), 2);
    }
}
