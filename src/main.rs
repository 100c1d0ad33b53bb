use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lcov_reporter::changes::{ChangedFilesSource, DiffChanges, GitChanges, ListChanges};
use lcov_reporter::cli::{self, Style};
use lcov_reporter::config::{ActionArgs, ActionSettings};
use lcov_reporter::{actions, report};

/// lcov-reporter: LCOV coverage summaries with baseline deltas for pull requests.
#[derive(Parser)]
#[command(name = "lcov-reporter", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as a GitHub Actions step (inputs come from INPUT_* variables).
    Action(ActionArgs),

    /// Render a report locally and print it.
    Report {
        /// Path to the current LCOV report.
        #[arg(long, default_value = "./coverage/lcov.info")]
        lcov: PathBuf,

        /// Baseline LCOV report to compare against.
        #[arg(long)]
        base: Option<PathBuf>,

        /// Only report files listed in this file, one per line ("-" for stdin).
        #[arg(long, conflicts_with_all = ["diff", "git_range"])]
        changed_files: Option<PathBuf>,

        /// Only report files touched by this unified diff ("-" for stdin).
        #[arg(long, conflicts_with = "git_range")]
        diff: Option<PathBuf>,

        /// Only report files changed in a git range, e.g. "origin/main...HEAD".
        #[arg(long)]
        git_range: Option<String>,

        /// Path prefix to strip from report paths.
        #[arg(long, default_value = "")]
        prefix: String,

        /// Directory the report paths are relative to.
        #[arg(long, default_value = "./")]
        working_dir: String,

        /// Report heading.
        #[arg(long, default_value = "")]
        title: String,

        /// Repository full name (owner/repo), for file links.
        #[arg(long, default_value = "")]
        repository: String,

        /// Commit SHA, for file links.
        #[arg(long, default_value = "")]
        commit: String,

        /// Output style.
        #[arg(long, value_enum, default_value = "markdown")]
        style: Style,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
        EnvFilter::new(if debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", actions::error_command(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Action(args) => {
            let settings = ActionSettings::resolve(&args)?;
            cli::run_action(&settings)?;
            Ok(())
        }
        Commands::Report {
            lcov,
            base,
            changed_files,
            diff,
            git_range,
            prefix,
            working_dir,
            title,
            repository,
            commit,
            style,
        } => {
            let source: Option<Box<dyn ChangedFilesSource>> =
                match (changed_files, diff, git_range) {
                    (Some(path), _, _) => Some(Box::new(ListChanges { path })),
                    (_, Some(path), _) => Some(Box::new(DiffChanges { path })),
                    (_, _, Some(range)) => Some(Box::new(GitChanges { range })),
                    _ => None,
                };
            let options = report::DiffOptions {
                repository,
                title,
                commit,
                prefix,
                working_dir,
                ..Default::default()
            };
            let out = cli::cmd_report(&lcov, base.as_deref(), source.as_deref(), options, &style)?;
            print!("{out}");
            Ok(())
        }
    }
}
