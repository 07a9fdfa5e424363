//! Commit history and remote discovery for a local working copy.

use std::path::Path;
use std::process::Command;

use git2::Repository;
use yearpulse_core::PulseError;

/// `git log` format producing `timestamp|name|email` lines.
pub const LOG_FORMAT: &str = "--pretty=format:%aI|%aN|%aE";

/// Read one `timestamp|name|email` line per commit authored since
/// January 1st of `start_year`.
///
/// # Errors
///
/// Returns [`PulseError::Git`] if git cannot be run or exits with an error
/// (for example when `working_copy` is not a repository). Callers decide
/// whether to continue without commits.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use yearpulse_sources::git::read_commit_log;
///
/// let lines = read_commit_log(Path::new("."), 2024).unwrap();
/// for line in &lines {
///     println!("{line}");
/// }
/// ```
pub fn read_commit_log(working_copy: &Path, start_year: i32) -> Result<Vec<String>, PulseError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(working_copy)
        .args(["log", &format!("--since={start_year}-01-01"), LOG_FORMAT])
        .output()
        .map_err(|e| PulseError::Git(format!("failed to run git log: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PulseError::Git(format!("git log failed: {}", stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Find the `owner/name` of the GitHub project a working copy tracks.
///
/// Remotes are tried with `origin` first, then in the order git lists them.
///
/// # Errors
///
/// Returns [`PulseError::Git`] if the repository cannot be opened or no
/// remote points at github.com.
pub fn discover_project(working_copy: &Path) -> Result<String, PulseError> {
    let repo = Repository::discover(working_copy).map_err(|e| {
        PulseError::Git(format!(
            "failed to open repository at {}: {e}",
            working_copy.display()
        ))
    })?;

    let remotes = repo
        .remotes()
        .map_err(|e| PulseError::Git(format!("failed to list remotes: {e}")))?;
    let mut names: Vec<&str> = remotes.iter().flatten().collect();
    names.sort_by_key(|name| *name != "origin");

    for name in names {
        let Ok(remote) = repo.find_remote(name) else {
            continue;
        };
        if let Some(project) = remote.url().and_then(parse_github_remote) {
            return Ok(project);
        }
    }

    Err(PulseError::Git(format!(
        "no GitHub remote found in {}",
        working_copy.display()
    )))
}

/// Extract `owner/name` from a GitHub remote URL.
///
/// Accepts HTTPS, `ssh://` and scp-style URLs, with or without `.git`.
///
/// # Examples
///
/// ```
/// use yearpulse_sources::git::parse_github_remote;
///
/// assert_eq!(
///     parse_github_remote("git@github.com:rust-lang/cargo.git").as_deref(),
///     Some("rust-lang/cargo")
/// );
/// assert_eq!(
///     parse_github_remote("https://github.com/octocat/hello-world").as_deref(),
///     Some("octocat/hello-world")
/// );
/// assert_eq!(parse_github_remote("https://gitlab.com/a/b.git"), None);
/// ```
pub fn parse_github_remote(url: &str) -> Option<String> {
    const HOST: &str = "github.com";

    let start = url.find(HOST)? + HOST.len();
    let rest = &url[start..];
    let path = rest.strip_prefix(':').or_else(|| rest.strip_prefix('/'))?;
    let path = path.trim().trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let (owner, name) = path.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{owner}/{name}"))
}
