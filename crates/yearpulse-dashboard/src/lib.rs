//! Keeps the static dashboard page in step with the exported reports.
//!
//! The page embeds its project list as a JavaScript array literal,
//! `const projectFiles = [ ... ];`. Syncing rewrites that literal from the
//! `*_final_report.json` files present in the output directory.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use yearpulse_core::{PulseError, REPORT_SUFFIX};

/// One entry of the dashboard's project list.
///
/// # Examples
///
/// ```
/// use yearpulse_dashboard::ProjectEntry;
///
/// let entry = ProjectEntry::from_file_name("postgres_postgres_final_report.json").unwrap();
/// assert_eq!(entry.id, "postgres_postgres");
/// assert_eq!(entry.name, "Postgres");
/// assert_eq!(entry.file, "output/postgres_postgres_final_report.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectEntry {
    pub id: String,
    /// Display name: the owner segment of `id`, capitalized.
    pub name: String,
    /// Path of the report relative to the page.
    pub file: String,
}

impl ProjectEntry {
    /// Entry for a report file name, or `None` if it is not a report.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let id = file_name.strip_suffix(REPORT_SUFFIX)?;
        let owner = id.split('_').next().unwrap_or(id);
        Some(Self {
            id: id.to_string(),
            name: capitalize(owner),
            file: format!("output/{file_name}"),
        })
    }
}

// First character upper-cased, the rest lower-cased.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Report entries found in `output_dir`, sorted by file name.
///
/// # Errors
///
/// Returns [`PulseError::Dashboard`] if `output_dir` is missing, or
/// [`PulseError::Io`] if it cannot be read.
pub fn scan_reports(output_dir: &Path) -> Result<Vec<ProjectEntry>, PulseError> {
    if !output_dir.is_dir() {
        return Err(PulseError::Dashboard(format!(
            "output directory {} not found",
            output_dir.display()
        )));
    }

    let mut file_names = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            file_names.push(name.to_string());
        }
    }
    file_names.sort();

    Ok(file_names
        .iter()
        .filter_map(|name| ProjectEntry::from_file_name(name))
        .collect())
}

fn project_files_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)const projectFiles = \[.*?\];").expect("project list pattern is valid")
    })
}

/// Replace every `projectFiles` literal in `html` with `entries`.
///
/// # Errors
///
/// Returns [`PulseError::Dashboard`] if the page has no such literal.
///
/// # Examples
///
/// ```
/// use yearpulse_dashboard::{render_project_list, ProjectEntry};
///
/// let html = "<script>\nconst projectFiles = [];\n</script>";
/// let entries = vec![ProjectEntry::from_file_name("a_b_final_report.json").unwrap()];
/// let updated = render_project_list(html, &entries).unwrap();
/// assert!(updated.contains("\"id\": \"a_b\""));
/// assert!(updated.ends_with("];\n</script>"));
/// ```
pub fn render_project_list(html: &str, entries: &[ProjectEntry]) -> Result<String, PulseError> {
    let pattern = project_files_pattern();
    if !pattern.is_match(html) {
        return Err(PulseError::Dashboard(
            "no `const projectFiles = [...];` block found".into(),
        ));
    }

    let list = to_indented_json(entries)?;
    let replacement = format!("const projectFiles = {list};");
    Ok(pattern
        .replace_all(html, regex::NoExpand(&replacement))
        .into_owned())
}

fn to_indented_json(entries: &[ProjectEntry]) -> Result<String, PulseError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"        ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| PulseError::Dashboard(format!("invalid UTF-8 in JSON: {e}")))
}

/// Rewrite the project list of the page at `html_path` from the reports in
/// `output_dir`. Returns the number of projects written.
///
/// # Errors
///
/// Returns [`PulseError::FileNotFound`] if the page is missing, and
/// [`PulseError::Dashboard`] if the output directory is missing or the page
/// has no project list. The page is left untouched on error.
pub fn sync_dashboard(html_path: &Path, output_dir: &Path) -> Result<usize, PulseError> {
    let entries = scan_reports(output_dir)?;
    if !html_path.exists() {
        return Err(PulseError::FileNotFound(html_path.to_path_buf()));
    }

    let html = std::fs::read_to_string(html_path)?;
    let updated = render_project_list(&html, &entries)?;
    std::fs::write(html_path, updated)?;
    Ok(entries.len())
}
