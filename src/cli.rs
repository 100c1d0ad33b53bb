//! Command handler functions for the lcov-reporter CLI.
//!
//! Handlers return their output as a `String` (or write it to the runner
//! files they are given), making them easy to test without capturing stdout.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::actions::{self, MAX_SUMMARY_CHARS};
use crate::changes::{ChangedFilesSource, GitHubChanges};
use crate::config::ActionSettings;
use crate::github::{self, PullRequest};
use crate::model::CoverageSnapshot;
use crate::parsers::lcov;
use crate::report::{self, DiffOptions, MarkdownFormatter, TextFormatter};

/// Output style for the `report` command.
#[derive(Clone, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
}

/// Commit and branch information shown in the report header and links.
#[derive(Debug, Clone, Default)]
pub struct CommitInfo {
    pub commit: String,
    pub head: String,
    pub base: String,
    pub base_commit: String,
}

impl From<&PullRequest> for CommitInfo {
    fn from(pr: &PullRequest) -> Self {
        Self {
            commit: pr.head.sha.clone(),
            head: pr.head.ref_name.clone(),
            base: pr.base.ref_name.clone(),
            base_commit: pr.base.sha.clone(),
        }
    }
}

/// Read and parse the current report. `Ok(None)` means there is nothing to
/// report on; a file that exists but is not text is an error.
pub fn load_current(path: &Path) -> Result<Option<CoverageSnapshot>> {
    let raw = match std::fs::read(path) {
        Ok(raw) if !raw.is_empty() => raw,
        Ok(_) | Err(_) => {
            info!("No coverage report found at '{}', exiting...", path.display());
            return Ok(None);
        }
    };
    let snapshot = lcov::parse(&raw)
        .with_context(|| format!("Failed to parse coverage report {}", path.display()))?;
    log_summary_mismatches(&snapshot, "current");
    Ok(Some(snapshot))
}

/// Read and parse the baseline report. Any failure downgrades to "no
/// baseline" so the report still renders without deltas.
pub fn load_baseline(path: &Path) -> Option<CoverageSnapshot> {
    let raw = match std::fs::read(path) {
        Ok(raw) if !raw.is_empty() => raw,
        Ok(_) | Err(_) => {
            warn!("No coverage report found at '{}', ignoring...", path.display());
            return None;
        }
    };
    match lcov::parse(&raw) {
        Ok(snapshot) => {
            log_summary_mismatches(&snapshot, "baseline");
            Some(snapshot)
        }
        Err(e) => {
            warn!("Ignoring baseline report {}: {e}", path.display());
            None
        }
    }
}

fn log_summary_mismatches(snapshot: &CoverageSnapshot, which: &str) {
    for file in &snapshot.files {
        for (tag, reported, computed) in file.summary_mismatches() {
            debug!(
                report = which,
                path = %file.path,
                tag,
                reported,
                computed,
                "summary counter disagrees with detail records"
            );
        }
    }
}

/// Local report: parse files, optionally filter, and format to a string.
pub fn cmd_report(
    lcov_file: &Path,
    base_file: Option<&Path>,
    changes: Option<&dyn ChangedFilesSource>,
    mut options: DiffOptions,
    style: &Style,
) -> Result<String> {
    let raw = std::fs::read(lcov_file)
        .with_context(|| format!("Failed to read coverage report {}", lcov_file.display()))?;
    let current = lcov::parse(&raw)?;
    log_summary_mismatches(&current, "current");
    let baseline = base_file.and_then(load_baseline);

    if let Some(source) = changes {
        options.should_filter_changed_files = true;
        options.changed_files = Some(source.changed_files()?);
    }

    let report = report::build_report(&current, baseline.as_ref(), &options);
    let output = match style {
        Style::Text => report.format(&TextFormatter),
        Style::Markdown => report.format(&MarkdownFormatter),
    };
    Ok(output)
}

/// Build the diff options for an action run from settings and commit info.
pub fn action_options(
    settings: &ActionSettings,
    info: CommitInfo,
    changed_files: Option<BTreeSet<String>>,
) -> DiffOptions {
    DiffOptions {
        repository: settings.repository.clone(),
        title: settings.title.clone(),
        commit: info.commit,
        base: info.base,
        head: info.head,
        base_commit: info.base_commit,
        prefix: settings.prefix.clone(),
        working_dir: settings.working_dir.clone(),
        server_url: settings.server_url.clone(),
        should_filter_changed_files: settings.filter_changed_files,
        changed_files,
    }
}

/// Render the action's Markdown body, or `None` when there is no current
/// report.
pub fn render_action(
    settings: &ActionSettings,
    info: CommitInfo,
    changed_files: Option<BTreeSet<String>>,
) -> Result<Option<String>> {
    let Some(current) = load_current(&settings.lcov_file)? else {
        return Ok(None);
    };
    let baseline = settings.lcov_base.as_deref().and_then(load_baseline);

    let options = action_options(settings, info, changed_files);
    Ok(Some(report::diff(&current, baseline.as_ref(), &options)))
}

/// Write the body to the step output and the (truncated) job summary.
/// Without runner files, the body goes to stdout.
pub fn publish(settings: &ActionSettings, body: &str) -> Result<()> {
    let summary = actions::truncate_chars(body, MAX_SUMMARY_CHARS);
    let overflow = body.chars().count() - summary.chars().count();
    if overflow > 0 {
        warn!("Final summary is {overflow} characters longer than the GitHub summary limit (1MiB)");
    }

    match settings.output_file {
        Some(ref path) => actions::set_output(path, "comment", body)
            .with_context(|| format!("Failed to write step output to {}", path.display()))?,
        None => println!("{body}"),
    }

    if let Some(ref path) = settings.summary_file {
        actions::append_summary(path, summary)
            .with_context(|| format!("Failed to write job summary to {}", path.display()))?;
    }

    Ok(())
}

/// Full GitHub Actions run: resolve pull request metadata, collect changed
/// files, render and publish. Returns the body when one was produced.
pub fn run_action(settings: &ActionSettings) -> Result<Option<String>> {
    if !settings.lcov_file.exists() {
        info!(
            "No coverage report found at '{}', exiting...",
            settings.lcov_file.display()
        );
        return Ok(None);
    }

    let (commit_info, changed_files) = match (settings.pr_number, settings.token.as_deref()) {
        (Some(number), Some(token)) => {
            let context = github::Context::new(token, &settings.repository, &settings.api_url);
            let pr = context.fetch_pull_request(number)?;
            info!(pr = pr.number, head = %pr.head.ref_name, base = %pr.base.ref_name, "pull request");

            let changed_files = if settings.filter_changed_files {
                let source = GitHubChanges {
                    context: &context,
                    pr_number: number,
                };
                Some(source.changed_files()?)
            } else {
                None
            };
            (CommitInfo::from(&pr), changed_files)
        }
        _ => {
            if settings.filter_changed_files {
                warn!("Not running for a pull request; filter-changed-files is ignored");
            }
            let commit_info = CommitInfo {
                commit: settings.sha.clone(),
                head: settings.ref_name.clone(),
                ..Default::default()
            };
            (commit_info, None)
        }
    };

    let Some(body) = render_action(settings, commit_info, changed_files)? else {
        return Ok(None);
    };
    publish(settings, &body)?;
    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ListChanges;
    use crate::config::ActionArgs;

    fn settings_in(dir: &Path) -> ActionSettings {
        let mut settings = ActionSettings::resolve(&ActionArgs::default()).unwrap();
        settings.lcov_file = dir.join("lcov.info");
        settings.output_file = Some(dir.join("output"));
        settings.summary_file = Some(dir.join("summary.md"));
        settings
    }

    #[test]
    fn test_cmd_report_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let lcov_path = dir.path().join("lcov.info");
        std::fs::write(&lcov_path, "SF:src/foo.rs\nDA:1,5\nDA:2,0\nend_of_record\n").unwrap();

        let out = cmd_report(&lcov_path, None, None, DiffOptions::default(), &Style::Markdown)
            .unwrap();

        assert!(out.contains("## Coverage Report"));
        assert!(out.contains("#### Total coverage: 50% \u{2796}"));
        assert!(out.contains("`src/foo.rs`"));
    }

    #[test]
    fn test_cmd_report_text_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        let lcov_path = dir.path().join("lcov.info");
        std::fs::write(
            &lcov_path,
            "SF:src/a.rs\nDA:1,1\nend_of_record\nSF:src/b.rs\nDA:1,0\nend_of_record\n",
        )
        .unwrap();
        let list = dir.path().join("changed.txt");
        std::fs::write(&list, "src/b.rs\n").unwrap();
        let source = ListChanges { path: list };

        let out = cmd_report(
            &lcov_path,
            None,
            Some(&source as &dyn ChangedFilesSource),
            DiffOptions::default(),
            &Style::Text,
        )
        .unwrap();

        assert!(out.contains("Total coverage: 0%"));
        assert!(out.contains("src/b.rs"));
        assert!(!out.contains("src/a.rs"));
    }

    #[test]
    fn test_cmd_report_missing_file_fails() {
        let result = cmd_report(
            Path::new("/nonexistent/lcov.info"),
            None,
            None,
            DiffOptions::default(),
            &Style::Text,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_baseline_missing_is_none() {
        assert!(load_baseline(Path::new("/nonexistent/base.info")).is_none());
    }

    #[test]
    fn test_load_baseline_binary_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.info");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        assert!(load_baseline(&path).is_none());
    }

    #[test]
    fn test_load_current_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcov.info");
        std::fs::write(&path, [0xffu8, 0xfe, 0x00]).unwrap();
        assert!(load_current(&path).is_err());
    }

    #[test]
    fn test_run_action_without_report_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        assert!(run_action(&settings).unwrap().is_none());
        assert!(!dir.path().join("output").exists());
        assert!(!dir.path().join("summary.md").exists());
    }

    #[test]
    fn test_run_action_outside_pull_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.repository = "owner/repo".to_string();
        settings.sha = "cafebabe".to_string();
        settings.ref_name = "main".to_string();
        settings.filter_changed_files = true;
        std::fs::write(&settings.lcov_file, "SF:src/a.js\nDA:1,1\nend_of_record\n").unwrap();

        let body = run_action(&settings).unwrap().unwrap();

        assert!(body.contains("Coverage for this commit"));
        assert!(body.contains("https://github.com/owner/repo/blob/cafebabe/src/a.js"));
        // Filtering needs a pull request, so the full report is shown.
        assert!(body.contains("<summary>Coverage Report</summary>"));

        let output = std::fs::read_to_string(dir.path().join("output")).unwrap();
        assert!(output.starts_with("comment<<ghadelimiter_"));
        let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(summary.contains("#### Total coverage: 100%"));
    }
}
