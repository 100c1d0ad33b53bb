//! Workflow configuration.
//!
//! GitHub exposes action inputs as `INPUT_<NAME>` variables (name upper-cased,
//! hyphens kept) and sets unused inputs to the empty string, so every input
//! is read as an optional string and empty values count as unset.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::github;

pub const DEFAULT_LCOV_FILE: &str = "./coverage/lcov.info";
pub const DEFAULT_WORKING_DIR: &str = "./";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Raw action inputs and runner environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ActionArgs {
    /// Token used to read pull request metadata.
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// LCOV report, relative to the working directory.
    #[arg(long, env = "INPUT_LCOV-FILE")]
    pub lcov_file: Option<String>,

    /// Baseline LCOV report to compare against.
    #[arg(long, env = "INPUT_LCOV-BASE")]
    pub lcov_base: Option<String>,

    /// Directory the report paths are relative to.
    #[arg(long, env = "INPUT_WORKING-DIRECTORY")]
    pub working_directory: Option<String>,

    /// Pull request number (default: taken from GITHUB_REF).
    #[arg(long, env = "INPUT_PR-NUMBER")]
    pub pr_number: Option<String>,

    /// Only report files changed by the pull request ("true"/"false").
    #[arg(long, env = "INPUT_FILTER-CHANGED-FILES")]
    pub filter_changed_files: Option<String>,

    /// Report heading.
    #[arg(long, env = "INPUT_TITLE")]
    pub title: Option<String>,

    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workspace: Option<String>,

    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, env = "GITHUB_SERVER_URL")]
    pub server_url: Option<String>,

    #[arg(long = "ref", env = "GITHUB_REF")]
    pub git_ref: Option<String>,

    #[arg(long = "ref-name", env = "GITHUB_REF_NAME")]
    pub ref_name: Option<String>,

    #[arg(long, env = "GITHUB_SHA")]
    pub sha: Option<String>,

    /// File receiving step outputs.
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub output_file: Option<PathBuf>,

    /// File receiving the job summary.
    #[arg(long, env = "GITHUB_STEP_SUMMARY")]
    pub summary_file: Option<PathBuf>,
}

/// Resolved, typed settings for one action run.
#[derive(Debug, Clone)]
pub struct ActionSettings {
    pub token: Option<String>,
    pub lcov_file: PathBuf,
    pub lcov_base: Option<PathBuf>,
    pub working_dir: String,
    pub pr_number: Option<u64>,
    pub filter_changed_files: bool,
    pub title: String,
    pub repository: String,
    /// Prefix stripped from report paths: the workspace root plus `/`.
    pub prefix: String,
    pub api_url: String,
    pub server_url: String,
    /// Commit to link to when there is no pull request.
    pub sha: String,
    /// Branch name to show when there is no pull request.
    pub ref_name: String,
    pub output_file: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `true` only for a case-insensitive "true".
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

impl ActionSettings {
    pub fn resolve(args: &ActionArgs) -> Result<Self> {
        let working_dir = non_empty(&args.working_directory)
            .unwrap_or(DEFAULT_WORKING_DIR)
            .to_string();
        let lcov_file = Path::new(&working_dir)
            .join(non_empty(&args.lcov_file).unwrap_or(DEFAULT_LCOV_FILE));

        let pr_number = match non_empty(&args.pr_number) {
            Some(n) => Some(
                n.parse::<u64>()
                    .with_context(|| format!("Invalid pr-number input: '{n}'"))?,
            ),
            None => non_empty(&args.git_ref).and_then(github::pr_number_from_ref),
        };

        let token = non_empty(&args.github_token).map(str::to_string);
        if pr_number.is_some() && token.is_none() {
            bail!("The github-token input is required to read pull request metadata");
        }

        let repository = non_empty(&args.repository).unwrap_or_default().to_string();
        if pr_number.is_some() && repository.is_empty() {
            bail!("GITHUB_REPOSITORY must be set to read pull request metadata");
        }

        let prefix = non_empty(&args.workspace)
            .map(|ws| crate::path::normalize(&format!("{ws}/"), ""))
            .unwrap_or_default();

        Ok(Self {
            token,
            lcov_file,
            lcov_base: non_empty(&args.lcov_base).map(PathBuf::from),
            working_dir,
            pr_number,
            filter_changed_files: parse_flag(non_empty(&args.filter_changed_files)),
            title: non_empty(&args.title).unwrap_or_default().to_string(),
            repository,
            prefix,
            api_url: non_empty(&args.api_url)
                .unwrap_or(github::DEFAULT_API_URL)
                .to_string(),
            server_url: non_empty(&args.server_url)
                .unwrap_or(DEFAULT_SERVER_URL)
                .to_string(),
            sha: non_empty(&args.sha).unwrap_or_default().to_string(),
            ref_name: non_empty(&args.ref_name).unwrap_or_default().to_string(),
            output_file: args.output_file.clone().filter(|p| !p.as_os_str().is_empty()),
            summary_file: args.summary_file.clone().filter(|p| !p.as_os_str().is_empty()),
        })
    }
}
