use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PulseError;

/// Environment variables consulted for the GitHub credential, in order.
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GIT_TOKEN_CLASSIC"];

/// Top-level configuration loaded from `.yearpulse.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
///
/// # Examples
///
/// ```
/// use yearpulse_core::PulseConfig;
///
/// let config = PulseConfig::default();
/// assert!(config.identity.ignored_domains.contains(&"gmail.com".to_string()));
/// assert_eq!(config.report.output_dir.to_str(), Some("output"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Contact-address normalization settings.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Export settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// Issue-source credentials.
    #[serde(default)]
    pub github: GitHubConfig,
}

impl PulseConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Io`] if the file cannot be read, or
    /// [`PulseError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, PulseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use yearpulse_core::PulseConfig;
    ///
    /// let toml = r#"
    /// [identity]
    /// ignored_domains = ["example.org"]
    /// "#;
    /// let config = PulseConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.identity.ignored_domains, vec!["example.org"]);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PulseError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Which contact-address domains count as "no organization".
///
/// # Examples
///
/// ```
/// use yearpulse_core::IdentityConfig;
///
/// let config = IdentityConfig::default();
/// assert!(config.ignored_domains.iter().any(|d| d == "users.noreply.github.com"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Personal and free-mail domains. Replaces the defaults when set.
    #[serde(default = "default_ignored_domains")]
    pub ignored_domains: Vec<String>,
}

/// The built-in personal / free-mail ignore-list.
pub fn default_ignored_domains() -> Vec<String> {
    [
        "gmail.com",
        "outlook.com",
        "users.noreply.github.com",
        "hotmail.com",
        "icloud.com",
        "yahoo.co.jp",
        "me.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            ignored_domains: default_ignored_domains(),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory the JSON export is written to (default: `output`).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// GitHub credential settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token. Environment variables take precedence.
    pub token: Option<String>,
}

impl GitHubConfig {
    /// Resolve the credential: explicit flag, then `GITHUB_TOKEN`,
    /// then `GIT_TOKEN_CLASSIC`, then the config file.
    ///
    /// # Errors
    ///
    /// Returns [`PulseError::Config`] if no non-empty token is found.
    pub fn resolve_token(&self, explicit: Option<&str>) -> Result<String, PulseError> {
        self.resolve_token_with(explicit, |name| std::env::var(name).ok())
    }

    fn resolve_token_with(
        &self,
        explicit: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, PulseError> {
        explicit
            .map(str::to_string)
            .into_iter()
            .chain(TOKEN_ENV_VARS.iter().filter_map(|name| lookup(*name)))
            .chain(self.token.clone())
            .find(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                PulseError::Config(
                    "no GitHub token. Pass --github-token or set GITHUB_TOKEN (or GIT_TOKEN_CLASSIC)"
                        .into(),
                )
            })
    }
}

/// File-name suffix of exported reports.
pub const REPORT_SUFFIX: &str = "_final_report.json";

/// Settings for a single analysis run, resolved once at startup and
/// passed explicitly into the pipeline.
///
/// # Examples
///
/// ```
/// use yearpulse_core::RunContext;
///
/// assert_eq!(RunContext::default_start_year(2026), 2024);
/// assert_eq!(
///     RunContext::export_file_name("rust-lang/cargo"),
///     "rust-lang_cargo_final_report.json"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Local working copy to read history from.
    pub working_copy: PathBuf,
    /// `owner/name` of the hosted project.
    pub project: String,
    /// First calendar year that appears in the report.
    pub start_year: i32,
    /// Credential for the issue source.
    pub token: String,
    /// Domains mapped to "no organization".
    pub ignored_domains: Vec<String>,
    /// Directory the export is written to.
    pub output_dir: PathBuf,
}

impl RunContext {
    /// Years of history shown when no start year is given.
    pub const DEFAULT_LOOKBACK_YEARS: i32 = 2;

    /// Start year used when none is requested.
    pub fn default_start_year(current_year: i32) -> i32 {
        current_year - Self::DEFAULT_LOOKBACK_YEARS
    }

    /// File name of the export for `project`, with path separators replaced.
    pub fn export_file_name(project: &str) -> String {
        let safe = project.replace(['/', '\\'], "_");
        format!("{safe}{REPORT_SUFFIX}")
    }

    /// Full export path for this run.
    pub fn export_path(&self) -> PathBuf {
        self.output_dir.join(Self::export_file_name(&self.project))
    }
}
