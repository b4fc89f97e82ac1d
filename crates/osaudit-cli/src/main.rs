//! osaudit - concurrent compliance auditing
//!
//! The `osaudit` command runs the built-in CIS-style benchmark against the
//! local host and reports pass / fail / error / skip per check.
//!
//! ## Commands
//!
//! - `run` (default): execute the selected checks and print the report
//! - `list`: print the checks a run with the same options would execute

mod progress;
mod render;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use osaudit_checks::{cis_benchmark, LocalHost};
use osaudit_core::{
    init_tracing, level_for, run_benchmark, AuditConfig, IdFilter, ProgressTracker, RunRequest,
};

use render::{exit_code, render_json, render_text, EXIT_INFRA};

#[derive(Parser)]
#[command(name = "osaudit")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Audit this host against a CIS-style hardening benchmark", long_about = None)]
struct Cli {
    /// Run checks one at a time in catalog order with debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Like --verbose, with trace-level logging
    #[arg(long, global = true)]
    trace: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    selection: Selection,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the selected checks and print the report
    Run {
        #[command(flatten)]
        selection: Selection,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the checks that would run
    List {
        #[command(flatten)]
        selection: Selection,

        /// Output format [default: text]
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

/// Which checks to run and how.
#[derive(Args, Debug, Clone, Default)]
struct Selection {
    /// Benchmark level: 0 = any, 1 or 2
    #[arg(short, long, env = "OSAUDIT_LEVEL", value_parser = clap::value_parser!(u8).range(0..=2))]
    level: Option<u8>,

    /// Only run these ids and their sub-checks (comma separated or repeated)
    #[arg(short, long, env = "OSAUDIT_INCLUDE", value_delimiter = ',')]
    include: Vec<String>,

    /// Never run these ids or their sub-checks (comma separated or repeated)
    #[arg(short, long, env = "OSAUDIT_EXCLUDE", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Maximum number of checks running at once
    #[arg(short, long, env = "OSAUDIT_JOBS")]
    jobs: Option<usize>,

    /// Per-check timeout in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// TOML profile with default selection settings
    #[arg(short, long, env = "OSAUDIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
struct OutputArgs {
    /// Report format [default: text]
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Do not draw the progress line
    #[arg(long)]
    no_progress: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    #[default]
    Text,
    Json,
}

impl Selection {
    /// Fill options not given here from `outer` (flags placed before the
    /// subcommand).
    fn or(self, outer: Selection) -> Selection {
        Selection {
            level: self.level.or(outer.level),
            include: if self.include.is_empty() {
                outer.include
            } else {
                self.include
            },
            exclude: if self.exclude.is_empty() {
                outer.exclude
            } else {
                self.exclude
            },
            jobs: self.jobs.or(outer.jobs),
            timeout: self.timeout.or(outer.timeout),
            config: self.config.or(outer.config),
        }
    }

    /// Merge with a profile file, then validate into a request.
    fn into_request(self, sequential: bool) -> Result<RunRequest> {
        let file = match &self.config {
            Some(path) => AuditConfig::load(path)
                .with_context(|| format!("load profile '{}'", path.display()))?,
            None => AuditConfig::default(),
        };
        let overrides = AuditConfig {
            level: self.level,
            include: self.include,
            exclude: self.exclude,
            jobs: self.jobs,
            check_timeout_secs: self.timeout,
            sequential,
        };
        let merged = file.merge(overrides);
        debug!(?merged, "effective audit configuration");
        merged.into_request().context("invalid audit configuration")
    }
}

impl OutputArgs {
    fn or(self, outer: OutputArgs) -> OutputArgs {
        OutputArgs {
            format: self.format.or(outer.format),
            no_progress: self.no_progress || outer.no_progress,
        }
    }
}

/// What to do, with top-level and subcommand options combined.
#[derive(Debug)]
enum Action {
    Run(Selection, OutputArgs),
    List(Selection, Format),
}

impl Cli {
    fn action(self) -> Action {
        match self.command {
            Some(Commands::Run { selection, output }) => {
                Action::Run(selection.or(self.selection), output.or(self.output))
            }
            Some(Commands::List { selection, format }) => Action::List(
                selection.or(self.selection),
                format.or(self.output.format).unwrap_or_default(),
            ),
            None => Action::Run(self.selection, self.output),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.json, level_for(cli.verbose, cli.trace));

    match dispatch(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("osaudit: {err:#}");
            ExitCode::from(EXIT_INFRA)
        }
    }
}

async fn dispatch(cli: Cli) -> Result<u8> {
    let verbose = cli.verbose || cli.trace;
    match cli.action() {
        Action::Run(selection, output) => cmd_run(selection, output, verbose).await,
        Action::List(selection, format) => cmd_list(selection, format),
    }
}

/// Verbose runs are sequential and draw no progress line.
async fn cmd_run(selection: Selection, output: OutputArgs, verbose: bool) -> Result<u8> {
    let tracker = Arc::new(ProgressTracker::new());
    let request = selection.into_request(verbose)?;
    let benchmark = cis_benchmark(Arc::new(LocalHost::new())).context("build benchmark catalog")?;
    let total = benchmark.selected(&IdFilter::from_request(&request)).count();

    let observer = progress::enabled(verbose, output.no_progress)
        .then(|| progress::spawn_observer(Arc::clone(&tracker), total));

    let report = run_benchmark(&benchmark, request, Arc::clone(&tracker))
        .await
        .context("audit run failed")?;

    if let Some(observer) = observer {
        observer.await.context("progress observer failed")?;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match output.format.unwrap_or_default() {
        Format::Text => render_text(&report, &mut out).context("write report")?,
        Format::Json => render_json(&report, &mut out)?,
    }
    out.flush()?;

    Ok(exit_code(&report))
}

fn cmd_list(selection: Selection, format: Format) -> Result<u8> {
    let request = selection.into_request(false)?;
    let benchmark = cis_benchmark(Arc::new(LocalHost::new())).context("build benchmark catalog")?;
    let filter = IdFilter::from_request(&request);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Text => {
            for check in benchmark.selected(&filter) {
                let spec = check.spec();
                writeln!(
                    out,
                    "{:<10} L{}  {:<10}  {}",
                    spec.id, spec.level, spec.scoring_class, spec.description
                )?;
            }
        }
        Format::Json => {
            let specs: Vec<_> = benchmark.selected(&filter).map(|c| c.spec()).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&specs)?)?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use osaudit_core::{ExecutionMode, Level, RequestedLevel};

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["osaudit", "--level", "1", "-i", "1.1,5.2"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.selection.level, Some(1));
        assert_eq!(cli.selection.include, vec!["1.1", "5.2"]);
    }

    #[test]
    fn test_level_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["osaudit", "run", "--level", "3"]).is_err());
    }

    #[test]
    fn test_run_subcommand_selection() {
        let cli = Cli::try_parse_from([
            "osaudit", "run", "-e", "1.1.1", "-e", "3.4", "-j", "2", "--format", "json",
        ])
        .unwrap();
        let Action::Run(selection, output) = cli.action() else {
            panic!("expected run");
        };
        assert_eq!(output.format, Some(Format::Json));
        let request = selection.into_request(false).unwrap();
        assert_eq!(request.exclude.len(), 2);
        assert_eq!(request.max_concurrency.get(), 2);
    }

    #[test]
    fn test_flags_before_subcommand_are_kept() {
        let cli = Cli::try_parse_from(["osaudit", "--level", "2", "-e", "1", "run"]).unwrap();
        let Action::Run(selection, _) = cli.action() else {
            panic!("expected run");
        };
        let request = selection.into_request(false).unwrap();
        assert_eq!(request.requested_level, RequestedLevel::Only(Level::Two));
        assert_eq!(request.exclude.len(), 1);
        assert_eq!(request.exclude[0].as_str(), "1");
    }

    #[test]
    fn test_subcommand_flags_override_outer_ones() {
        let cli = Cli::try_parse_from([
            "osaudit", "--level", "2", "-i", "1", "--format", "json", "list", "--level", "1",
        ])
        .unwrap();
        let Action::List(selection, format) = cli.action() else {
            panic!("expected list");
        };
        assert_eq!(format, Format::Json);
        let request = selection.into_request(false).unwrap();
        assert_eq!(request.requested_level, RequestedLevel::Only(Level::One));
        assert_eq!(request.include.len(), 1);
    }

    #[test]
    fn test_verbose_runs_sequentially() {
        let selection = Selection {
            level: Some(2),
            ..Selection::default()
        };
        let request = selection.into_request(true).unwrap();
        assert_eq!(request.mode, ExecutionMode::Sequential);
        assert_eq!(request.requested_level, RequestedLevel::Only(Level::Two));
    }

    #[test]
    fn test_profile_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.toml");
        std::fs::write(&path, "level = 1\njobs = 6\nexclude = [\"2\"]\n").unwrap();

        let selection = Selection {
            jobs: Some(2),
            config: Some(path),
            ..Selection::default()
        };
        let request = selection.into_request(false).unwrap();
        assert_eq!(request.requested_level, RequestedLevel::Only(Level::One));
        assert_eq!(request.max_concurrency.get(), 2);
        assert_eq!(request.exclude.len(), 1);
    }
}
