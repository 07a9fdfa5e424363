use chrono::{DateTime, TimeZone, Utc};
use octocrab::models::issues::Issue;
use octocrab::params;
use yearpulse_core::PulseError;
use yearpulse_metrics::issues::IssueRecord;

/// Issues requested per API round trip (the API maximum).
const PER_PAGE: u8 = 100;

/// GitHub client that streams a project's issues and pull requests.
///
/// # Examples
///
/// ```
/// use yearpulse_sources::github::parse_project_reference;
///
/// let (owner, repo) = parse_project_reference("rust-lang/cargo").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "cargo");
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if `token` is empty, or
    /// [`PulseError::GitHub`] if the client cannot be built.
    pub fn new(token: &str) -> Result<Self, PulseError> {
        if token.trim().is_empty() {
            return Err(PulseError::Config("GitHub token is empty".into()));
        }

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| PulseError::GitHub(format!("failed to create GitHub client: {e}")))?;

        Ok(Self { octocrab })
    }

    /// Fetch every issue and pull request (open and closed) updated since
    /// `since`, handing each page to `on_page` as soon as it arrives.
    ///
    /// The API filters on update time, so issues created before `since`
    /// can appear. Only one page is held at a time. Returns the number of
    /// records delivered.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::GitHub`] if any request fails; pages already
    /// delivered stay delivered.
    pub async fn for_each_issue_page<F>(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
        mut on_page: F,
    ) -> Result<usize, PulseError>
    where
        F: FnMut(Vec<IssueRecord>),
    {
        let mut page = self
            .octocrab
            .issues(owner, repo)
            .list()
            .state(params::State::All)
            .since(since)
            .per_page(PER_PAGE)
            .send()
            .await
            .map_err(|e| {
                PulseError::GitHub(format!("failed to list issues for {owner}/{repo}: {e}"))
            })?;

        let mut delivered = 0;
        loop {
            let records: Vec<IssueRecord> = page.items.iter().map(issue_record).collect();
            delivered += records.len();
            on_page(records);

            match self
                .octocrab
                .get_page::<Issue>(&page.next)
                .await
                .map_err(|e| PulseError::GitHub(format!("failed to fetch next issue page: {e}")))?
            {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(delivered)
    }
}

fn issue_record(issue: &Issue) -> IssueRecord {
    IssueRecord {
        created_at: issue.created_at,
        closed_at: issue.closed_at,
    }
}

/// Midnight UTC on January 1st of `year`, the `since` bound for a run.
///
/// # Errors
///
/// Returns [`PulseError::Config`] for years chrono cannot represent.
///
/// # Examples
///
/// ```
/// use yearpulse_sources::github::start_of_year;
///
/// assert_eq!(start_of_year(2024).unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
/// ```
pub fn start_of_year(year: i32) -> Result<DateTime<Utc>, PulseError> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| PulseError::Config(format!("invalid start year: {year}")))
}

/// Parse a project reference string (`owner/name`) into its components.
///
/// # Errors
///
/// Returns [`PulseError::Config`] if the format is invalid.
pub fn parse_project_reference(project: &str) -> Result<(String, String), PulseError> {
    let invalid =
        || PulseError::Config(format!("invalid project '{project}', expected owner/name"));

    let (owner, repo) = project.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}
