/// Sources for the set of files a pull request changed.
///
/// The report engine only needs repository-relative paths; a
/// [`ChangedFilesSource`] hides where they come from (GitHub API, a local
/// `git diff`, a plain list, or a unified diff).
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};

use crate::github;
use crate::path;

/// A source for the changed file paths of a pull request.
pub trait ChangedFilesSource {
    /// Fetch the changed paths, normalized to repository-relative form.
    fn changed_files(&self) -> Result<BTreeSet<String>>;
}

/// Files of a GitHub pull request.
pub struct GitHubChanges<'a> {
    pub context: &'a github::Context,
    pub pr_number: u64,
}

impl ChangedFilesSource for GitHubChanges<'_> {
    fn changed_files(&self) -> Result<BTreeSet<String>> {
        let files = self.context.fetch_changed_files(self.pr_number)?;
        Ok(files.iter().map(|f| normalize_changed(f)).collect())
    }
}

/// Files changed in a git revision range (e.g., `origin/main...HEAD`).
pub struct GitChanges {
    pub range: String,
}

impl ChangedFilesSource for GitChanges {
    fn changed_files(&self) -> Result<BTreeSet<String>> {
        let output = Command::new("git")
            .args(["diff", "--name-only", &self.range])
            .output()
            .context("Failed to run git diff")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git diff failed: {stderr}");
        }

        let text = String::from_utf8(output.stdout).context("git diff output not valid UTF-8")?;
        Ok(parse_file_list(&text))
    }
}

/// Newline-separated list of paths from a file, or stdin for `-`.
pub struct ListChanges {
    pub path: PathBuf,
}

impl ChangedFilesSource for ListChanges {
    fn changed_files(&self) -> Result<BTreeSet<String>> {
        Ok(parse_file_list(&read_input(&self.path)?))
    }
}

/// Target paths of a unified diff from a file, or stdin for `-`.
pub struct DiffChanges {
    pub path: PathBuf,
}

impl ChangedFilesSource for DiffChanges {
    fn changed_files(&self) -> Result<BTreeSet<String>> {
        Ok(files_from_diff(&read_input(&self.path)?))
    }
}

fn read_input(path: &std::path::Path) -> Result<String> {
    if path.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read changed files from stdin")
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read changed files from {}", path.display()))
    }
}

fn normalize_changed(file: &str) -> String {
    path::repo_relative(file.trim(), "", "")
}

/// Parse one path per line, ignoring blank lines.
pub fn parse_file_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(normalize_changed)
        .collect()
}

/// Collect the new-side path of every file in a unified diff (e.g.,
/// `git diff`). Deleted files are skipped.
pub fn files_from_diff(diff_text: &str) -> BTreeSet<String> {
    let mut result = BTreeSet::new();

    for line in diff_text.lines() {
        let Some(rest) = line.strip_prefix("+++ ") else {
            continue;
        };
        // Some tools append a tab and timestamp after the path.
        let rest = rest.split('\t').next().unwrap_or(rest);
        if rest == "/dev/null" {
            continue; // File was deleted
        }
        // Strip common VCS prefixes: "b/" (default git), "a/" (some tools).
        // Also handles --no-prefix diffs where no prefix is present.
        let path = rest
            .strip_prefix("b/")
            .or_else(|| rest.strip_prefix("a/"))
            .unwrap_or(rest);
        result.insert(normalize_changed(path));
    }

    result
}
