use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use yearpulse_core::{PulseConfig, RunContext};
use yearpulse_metrics::bucket::YearBuckets;
use yearpulse_metrics::identity::OrgResolver;
use yearpulse_metrics::report::Report;

const CONFIG_FILE: &str = ".yearpulse.toml";

#[derive(Parser)]
#[command(
    name = "yearpulse",
    version,
    about = "Yearly community-health metrics for a git repository",
    long_about = "Yearpulse summarizes a project's community health year by year.\n\n\
                   Reads commit history from a local working copy and issue/PR history from\n\
                   GitHub, then reports commit volume, contributors, bus factor, elephant\n\
                   factor, and issue lifecycle statistics per calendar year.\n\n\
                   Examples:\n  \
                     yearpulse analyze .                 Analyze the last two years\n  \
                     yearpulse analyze ../postgres 2020  Analyze from 2020 on\n  \
                     yearpulse dashboard                 Refresh index.html from ./output\n  \
                     yearpulse init                      Create a .yearpulse.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .yearpulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the report printed on stdout.\n\n\
                       Formats:\n  \
                         text      Fixed-width table (default)\n  \
                         json      The export document\n  \
                         markdown  GitHub-flavored Markdown table"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Compute yearly metrics for a working copy and save the export
    #[command(long_about = "Compute yearly metrics for a working copy and save the export.\n\n\
        Commits come from `git log` in PATH; issues and pull requests come from the\n\
        GitHub project behind PATH's remote. Requires GITHUB_TOKEN (or\n\
        GIT_TOKEN_CLASSIC, or --github-token).\n\n\
        If git cannot read PATH, the run continues without commit data.\n\n\
        Examples:\n  yearpulse analyze .\n  yearpulse analyze ../repo 2021 --repo owner/name")]
    Analyze {
        /// Local working copy
        path: PathBuf,

        /// First year to report (default: two years before the current year)
        start_year: Option<i32>,

        /// GitHub project as owner/name (default: detected from the git remote)
        #[arg(long)]
        repo: Option<String>,

        /// GitHub personal access token
        #[arg(long)]
        github_token: Option<String>,

        /// Directory for the JSON export (default: output)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the report without writing the export
        #[arg(long)]
        no_save: bool,
    },
    /// Refresh the dashboard page's project list from saved exports
    #[command(long_about = "Refresh the dashboard page's project list from saved exports.\n\n\
        Rewrites the `const projectFiles = [...]` block of the page with one entry\n\
        per *_final_report.json file in the output directory.\n\n\
        Example:\n  yearpulse dashboard --html index.html --output-dir output")]
    Dashboard {
        /// Dashboard page to rewrite
        #[arg(long, default_value = "index.html")]
        html: PathBuf,

        /// Directory holding the exports (default: output)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Create a default .yearpulse.toml configuration file
    #[command(long_about = "Create a default .yearpulse.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .yearpulse.toml already exists.")]
    Init,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Fixed-width console table
    Text,
    /// The structured export document
    Json,
    /// Markdown table
    #[value(alias = "md")]
    Markdown,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1myearpulse\x1b[0m v{version} — yearly community-health metrics\n");
        println!("Commands:");
        println!("  \x1b[32manalyze\x1b[0m    Compute yearly metrics and save the export");
        println!("  \x1b[32mdashboard\x1b[0m  Refresh the dashboard's project list");
        println!("  \x1b[32minit\x1b[0m       Create default configuration\n");
    } else {
        println!("yearpulse v{version} — yearly community-health metrics\n");
        println!("Commands:");
        println!("  analyze    Compute yearly metrics and save the export");
        println!("  dashboard  Refresh the dashboard's project list");
        println!("  init       Create default configuration\n");
    }

    println!("Run 'yearpulse <command> --help' for details.");
}

fn warn(use_color: bool, message: &str) {
    if use_color {
        eprintln!("\x1b[33mwarning:\x1b[0m {message}");
    } else {
        eprintln!("warning: {message}");
    }
}

struct AnalyzeArgs<'a> {
    path: &'a Path,
    start_year: Option<i32>,
    repo: Option<&'a str>,
    github_token: Option<&'a str>,
    output_dir: Option<&'a Path>,
}

/// Resolve everything an analysis run needs. Any failure here is fatal and
/// happens before history is read.
fn resolve_context(config: &PulseConfig, args: AnalyzeArgs<'_>) -> Result<RunContext> {
    let token = config.github.resolve_token(args.github_token)?;

    if !args.path.exists() {
        miette::bail!(miette::miette!(
            help = "Pass the path of a local clone",
            "Working copy not found: {}",
            args.path.display()
        ));
    }

    let project = match args.repo {
        Some(project) => project.to_string(),
        None => yearpulse_sources::git::discover_project(args.path).map_err(|e| {
            miette::miette!(
                help = "Pass --repo owner/name to name the GitHub project explicitly",
                "Could not determine the GitHub project: {e}"
            )
        })?,
    };
    yearpulse_sources::github::parse_project_reference(&project)?;

    let start_year = args
        .start_year
        .unwrap_or_else(|| RunContext::default_start_year(Local::now().year()));

    Ok(RunContext {
        working_copy: args.path.to_path_buf(),
        project,
        start_year,
        token,
        ignored_domains: config.identity.ignored_domains.clone(),
        output_dir: args
            .output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config.report.output_dir.clone()),
    })
}

fn issue_spinner() -> Result<Option<indicatif::ProgressBar>> {
    if !std::io::stderr().is_terminal() {
        return Ok(None);
    }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
            .into_diagnostic()?,
    );
    pb.set_message("Fetching issues...");
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Ok(Some(pb))
}

async fn run_analysis(ctx: &RunContext, verbose: bool, use_color: bool) -> Result<Report> {
    let orgs = OrgResolver::new(&ctx.ignored_domains);
    let mut buckets = YearBuckets::new();

    eprintln!("--- Analyzing {} since {} ---", ctx.project, ctx.start_year);
    if verbose {
        eprintln!(
            "Working copy: {} ({} ignored mail domains)",
            ctx.working_copy.display(),
            ctx.ignored_domains.len()
        );
    }

    eprintln!("Step 1: Analyzing local git log...");
    // A failing git source is not fatal: report on issues alone.
    let lines = yearpulse_sources::git::read_commit_log(&ctx.working_copy, ctx.start_year)
        .unwrap_or_else(|e| {
            warn(use_color, &format!("{e}; continuing without commit data"));
            Vec::new()
        });
    let commits = yearpulse_metrics::commits::aggregate_commits(&mut buckets, &orgs, lines);
    eprintln!("Counted {commits} commits.");

    eprintln!("Step 2: Gathering GitHub issues and pull requests...");
    let (owner, repo) = yearpulse_sources::github::parse_project_reference(&ctx.project)?;
    let since = yearpulse_sources::github::start_of_year(ctx.start_year)?;
    let client = yearpulse_sources::github::GitHubClient::new(&ctx.token)?;

    let spinner = issue_spinner()?;
    let mut processed = 0usize;
    let fetched = client
        .for_each_issue_page(&owner, &repo, since, |page| {
            processed += yearpulse_metrics::issues::aggregate_issues(&mut buckets, page);
            if let Some(pb) = &spinner {
                pb.set_message(format!("Processed {processed} items..."));
            }
        })
        .await
        .inspect_err(|_| {
            if let Some(pb) = &spinner {
                pb.finish_with_message("Failed");
            }
        })?;
    if let Some(pb) = spinner {
        pb.finish_with_message(format!("Processed {fetched} items"));
    }
    eprintln!("Counted {fetched} issues and pull requests.");

    let report = Report::build(
        &ctx.project,
        ctx.start_year,
        &buckets,
        Local::now().fixed_offset(),
    );
    if verbose {
        eprintln!(
            "Accumulated {} years, reporting {} (from {}).",
            buckets.len(),
            report.metrics.len(),
            ctx.start_year
        );
    }
    Ok(report)
}

const DEFAULT_CONFIG: &str = r#"# yearpulse configuration

[identity]
# Mail domains that count as "no organization" (replaces the defaults)
# ignored_domains = ["gmail.com", "outlook.com", "users.noreply.github.com", "hotmail.com", "icloud.com", "yahoo.co.jp", "me.com"]

[report]
# output_dir = "output"

[github]
# Prefer GITHUB_TOKEN in the environment over storing a token here
# token = "ghp_..."
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PulseConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                PulseConfig::from_file(default_path)?
            } else {
                PulseConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Analyze {
            ref path,
            start_year,
            ref repo,
            ref github_token,
            ref output_dir,
            no_save,
        }) => {
            let ctx = resolve_context(
                &config,
                AnalyzeArgs {
                    path,
                    start_year,
                    repo: repo.as_deref(),
                    github_token: github_token.as_deref(),
                    output_dir: output_dir.as_deref(),
                },
            )?;

            let report = run_analysis(&ctx, cli.verbose, use_color).await?;

            match cli.format {
                OutputFormat::Json => println!("{}", report.to_json()?),
                OutputFormat::Markdown => print!("{}", report.to_markdown()),
                OutputFormat::Text => print!("\n{report}"),
            }

            if !no_save {
                let export_path = ctx.export_path();
                report.save(&export_path)?;
                eprintln!("Success! Final data saved to: {}", export_path.display());
            }
        }
        Some(Command::Dashboard {
            ref html,
            ref output_dir,
        }) => {
            let output_dir = output_dir
                .clone()
                .unwrap_or_else(|| config.report.output_dir.clone());
            let count = yearpulse_dashboard::sync_dashboard(html, &output_dir)?;
            println!(
                "Dashboard updated with {count} projects from '{}'.",
                output_dir.display()
            );
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
    }

    Ok(())
}
