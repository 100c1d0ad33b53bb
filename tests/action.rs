mod common;

use std::path::Path;

use lcov_reporter::cli::{self, CommitInfo};
use lcov_reporter::config::{ActionArgs, ActionSettings};

fn settings(dir: &Path) -> ActionSettings {
    let args = ActionArgs {
        working_directory: Some(dir.display().to_string()),
        lcov_file: Some("lcov.info".to_string()),
        lcov_base: Some(dir.join("base.info").display().to_string()),
        filter_changed_files: Some("true".to_string()),
        repository: Some("acme/app".to_string()),
        workspace: Some("/home/runner/work/app/app".to_string()),
        output_file: Some(dir.join("output")),
        summary_file: Some(dir.join("summary.md")),
        ..Default::default()
    };
    let mut settings = ActionSettings::resolve(&args).unwrap();
    // Report paths are relative to the repository root in these fixtures.
    settings.working_dir = "./".to_string();
    settings
}

fn copy_fixture(name: &str, to: &Path) {
    let from = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::copy(from, to).unwrap();
}

fn pr_info() -> CommitInfo {
    CommitInfo {
        commit: "1111111aaaaaaa".to_string(),
        head: "feature".to_string(),
        base: "main".to_string(),
        base_commit: "2222222bbbbbbb".to_string(),
    }
}

#[test]
fn render_with_changed_files_and_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    copy_fixture("current.lcov", &settings.lcov_file);
    copy_fixture("baseline.lcov", settings.lcov_base.as_ref().unwrap());

    let body = cli::render_action(
        &settings,
        pr_info(),
        Some(common::changed(&["src/app.js", "README.md"])),
    )
    .unwrap()
    .unwrap();

    assert!(body.contains("Coverage after merging **feature** into **main** will be"));
    assert!(body.contains("<summary>Coverage Report for Changed Files</summary>"));
    // 3/4 of app.js against 4/10 across the whole baseline.
    assert!(body.contains("#### Total coverage: 75% \u{1F4C8} +35%"));
    assert!(body.contains("https://github.com/acme/app/blob/1111111aaaaaaa/src/app.js"));
    assert!(!body.contains("src/util.js"));
}

#[test]
fn missing_baseline_renders_without_deltas() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    copy_fixture("current.lcov", &settings.lcov_file);

    let body = cli::render_action(&settings, pr_info(), None).unwrap().unwrap();

    assert!(body.contains("#### Total coverage: 75% \u{2796}\n"));
    assert!(body.contains("| N/A |"));
    assert!(!body.contains("Compared with base commit"));
}

#[test]
fn missing_current_report_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    assert!(cli::render_action(&settings, pr_info(), None).unwrap().is_none());
}

#[test]
fn empty_current_report_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    std::fs::write(&settings.lcov_file, "").unwrap();

    assert!(cli::render_action(&settings, pr_info(), None).unwrap().is_none());
}

#[test]
fn publish_writes_output_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    cli::publish(&settings, "## Coverage Report\n\nbody\n").unwrap();

    let output = std::fs::read_to_string(dir.path().join("output")).unwrap();
    assert!(output.starts_with("comment<<ghadelimiter_"));
    assert!(output.contains("\n## Coverage Report\n\nbody\n"));

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert_eq!(summary, "## Coverage Report\n\nbody\n");
}

#[test]
fn publish_truncates_only_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let body = "x".repeat(lcov_reporter::actions::MAX_SUMMARY_CHARS + 10);

    cli::publish(&settings, &body).unwrap();

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert_eq!(summary.trim_end().len(), lcov_reporter::actions::MAX_SUMMARY_CHARS);
    let output = std::fs::read_to_string(dir.path().join("output")).unwrap();
    assert!(output.contains(&body));
}
