use std::path::PathBuf;

/// Errors that can occur across yearpulse.
///
/// Library crates use this type directly; the binary converts to
/// `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use yearpulse_core::PulseError;
///
/// let err = PulseError::Config("missing GitHub token".into());
/// assert!(err.to_string().contains("missing GitHub token"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PulseError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(code(yearpulse::config))]
    Config(String),

    /// Git invocation or repository inspection failure.
    #[error("git error: {0}")]
    Git(String),

    /// GitHub API failure.
    #[error("GitHub error: {0}")]
    #[diagnostic(code(yearpulse::github))]
    GitHub(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Dashboard page could not be updated.
    #[error("dashboard error: {0}")]
    Dashboard(String),
}
