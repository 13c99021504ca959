use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use riskpulse_core::{OutputFormat, RepoId, RiskConfig};
use riskpulse_history::store::HistoryStore;
use riskpulse_report::html::{band_counts, render_html, Report};
use riskpulse_scan::demo::DemoSource;
use riskpulse_scan::github::{token_from_env, GitHubClient};
use riskpulse_scan::pipeline::{run_scan, ScanOutcome, ScanReport, ScanRequest};

#[derive(Parser)]
#[command(
    name = "riskpulse",
    version,
    about = "Score recent commit activity and flag files that stay critical",
    long_about = "riskpulse fetches recent commits for a GitHub repository, scores each changed\n\
                   file with a fixed churn/ownership heuristic, keeps a score history, and writes\n\
                   a static HTML report highlighting files critical two runs in a row.\n\n\
                   Examples:\n  \
                     riskpulse scan rust-lang/cargo        Score the last 30 days\n  \
                     riskpulse scan owner/repo --days 7    Use a shorter window\n  \
                     riskpulse demo                        Render a report from sample data\n  \
                     riskpulse history src/lib.rs          Show recorded runs for a file"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .riskpulse.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch commits, score files, and write the HTML report
    #[command(long_about = "Fetch commits, score files, and write the HTML report.\n\n\
        Reads GITHUB_TOKEN (or GH_TOKEN) for authentication when set. Without a\n\
        repository argument you are prompted for one, except in CI where it is an error.\n\n\
        Examples:\n  riskpulse scan octocat/hello-world\n  riskpulse scan owner/repo --format json --no-browser")]
    Scan {
        /// Repository in owner/name form
        repo: Option<String>,

        /// Trailing window in days (default: from config, 30)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,

        /// Report path (default: risk_report.html)
        #[arg(long)]
        output: Option<PathBuf>,

        /// History database path (default: .github/risk_scoring.db)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Do not open the report in a browser
        #[arg(long)]
        no_browser: bool,

        /// Also print scored rows to stdout
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Render a report from built-in sample data without network access
    Demo {
        /// Report path (default: risk_report.html)
        #[arg(long)]
        output: Option<PathBuf>,

        /// History database path (default: .github/risk_scoring.db)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Do not open the report in a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Show recorded score history for a file
    History {
        /// File path as it appears in the repository
        file: String,

        /// Maximum entries to show (default: 10)
        #[arg(long, default_value = "10")]
        limit: usize,

        /// History database path (default: .github/risk_scoring.db)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Create a default .riskpulse.toml configuration file
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# riskpulse configuration

[fetch]
# api_base = "https://api.github.com"
# window_days = 30
# per_page = 100
# user_agent = "riskpulse"

[policy]
# Paths containing any of these substrings are ignored.
# exclude = ["test", "vendor", "node_modules", ".md", ".json", ".lock"]
# Paths containing any of these substrings score as core system code.
# core_paths = ["src/auth", "src/api", "middleware", "services"]

[output]
# report_path = "risk_report.html"
# history_db = ".github/risk_scoring.db"
"#;

fn is_ci() -> bool {
    std::env::var("CI")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,riskpulse_core=debug,riskpulse_gitpulse=debug,riskpulse_history=debug,riskpulse_scan=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<RiskConfig> {
    match path {
        Some(path) => RiskConfig::from_file(path)
            .wrap_err(format!("loading config from {}", path.display())),
        None => {
            let default_path = Path::new(".riskpulse.toml");
            if default_path.exists() {
                RiskConfig::from_file(default_path).wrap_err("loading .riskpulse.toml")
            } else {
                Ok(RiskConfig::default())
            }
        }
    }
}

fn resolve_repo(arg: Option<String>) -> Result<RepoId> {
    let raw = match arg {
        Some(repo) => repo,
        None if is_ci() => {
            miette::bail!(miette::miette!(
                help = "Use: riskpulse scan owner/name",
                "Missing repository argument in CI"
            ));
        }
        None => {
            eprint!("repo (owner/name): ");
            std::io::stderr().flush().into_diagnostic()?;
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .into_diagnostic()
                .wrap_err("reading repository from stdin")?;
            line
        }
    };
    Ok(raw.parse::<RepoId>()?)
}

fn write_report(path: &Path, report: &ScanReport) -> Result<()> {
    let html = render_html(&Report {
        title: &report.repo,
        generated_at: report.generated_at,
        rows: &report.rows,
        alerts: &report.alerts,
    });
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .into_diagnostic()
            .wrap_err(format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, html)
        .into_diagnostic()
        .wrap_err(format!("writing {}", path.display()))
}

fn print_summary(report: &ScanReport) {
    let counts = band_counts(&report.rows)
        .iter()
        .rev()
        .map(|(band, n)| format!("{band}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    eprintln!(
        "Scored {} files from {} commits ({counts}).",
        report.rows.len(),
        report.commits_analyzed
    );
    for path in &report.alerts {
        eprintln!("ALERT: {path} has been critical two runs in a row");
    }
}

fn open_in_browser(path: &Path) {
    let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let status = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(&target).status()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(&target)
            .status()
    } else {
        std::process::Command::new("xdg-open").arg(&target).status()
    };
    if let Err(e) = status {
        tracing::warn!(error = %e, "could not open browser");
    }
}

fn finish(outcome: ScanOutcome, output: &Path, format: OutputFormat, browser: bool) -> Result<()> {
    let report = match outcome {
        ScanOutcome::NoActivity { commits } => {
            eprintln!(
                "No source files touched in the window ({commits} commits fetched). No report written."
            );
            return Ok(());
        }
        ScanOutcome::Scored(report) => report,
    };

    write_report(output, &report)?;
    print_summary(&report);

    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).into_diagnostic()?
        );
    }

    eprintln!("Report written to {}", output.display());
    if browser {
        open_in_browser(output);
    }
    Ok(())
}

fn main() -> Result<()> {
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
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Scan {
            repo,
            days,
            output,
            db,
            no_browser,
            format,
        } => {
            let repo = resolve_repo(repo)?;
            let window_days = days.unwrap_or(config.fetch.window_days);
            let output = output.unwrap_or_else(|| config.output.report_path.clone());
            let db = db.unwrap_or_else(|| config.output.history_db.clone());

            let client = GitHubClient::new(&config.fetch, token_from_env())?;
            let mut store = HistoryStore::open(&db)?;

            eprintln!("Analyzing {repo} (last {window_days} days)...");
            let spinner = if std::io::stderr().is_terminal() {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_style(
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                        .into_diagnostic()?,
                );
                pb.set_message("Fetching commits...");
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let request = ScanRequest {
                repo: &repo,
                window_days,
                policy: &config.policy,
                now: Utc::now(),
            };
            let outcome = run_scan(&client, &mut store, &request);
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }

            finish(outcome?, &output, format, !no_browser && !is_ci())?;
        }
        Command::Demo {
            output,
            db,
            no_browser,
        } => {
            let output = output.unwrap_or_else(|| config.output.report_path.clone());
            let db = db.unwrap_or_else(|| config.output.history_db.clone());
            let mut store = HistoryStore::open(&db)?;

            let now = Utc::now();
            let repo = DemoSource::repo();
            let request = ScanRequest {
                repo: &repo,
                window_days: config.fetch.window_days,
                policy: &config.policy,
                now,
            };
            eprintln!("Generating demo report from sample data...");
            let outcome = run_scan(&DemoSource::new(now), &mut store, &request)?;
            finish(outcome, &output, OutputFormat::Text, !no_browser && !is_ci())?;
        }
        Command::History { file, limit, db } => {
            let db = db.unwrap_or_else(|| config.output.history_db.clone());
            if !db.exists() {
                miette::bail!(miette::miette!(
                    help = "Run `riskpulse scan owner/name` first",
                    "No history database at {}",
                    db.display()
                ));
            }
            let store = HistoryStore::open(&db)?;
            let entries = store.recent(&file, limit)?;
            if entries.is_empty() {
                println!("No history for {file}");
            }
            for entry in entries {
                println!(
                    "{}  {:>2}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                    entry.score,
                    entry.band
                );
            }
        }
        Command::Init => {
            let path = Path::new(".riskpulse.toml");
            if path.exists() {
                miette::bail!(".riskpulse.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .riskpulse.toml with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "riskpulse", &mut std::io::stdout());
        }
    }

    Ok(())
}
