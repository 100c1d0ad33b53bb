//! Coverage diff and report rendering.
//!
//! [`build_report`] turns a current snapshot, an optional baseline and a set
//! of [`DiffOptions`] into a [`CoverageReport`]; a [`ReportFormatter`] then
//! renders it. [`diff`] is the one-call Markdown entry point.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use tracing::debug;

use crate::model::{CoverageSnapshot, CoverageSummary};
use crate::path;

/// Heading used when no title is configured.
pub const DEFAULT_TITLE: &str = "Coverage Report";

/// Everything the engine needs to know about the surrounding pull request.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Repository full name, `owner/repo`.
    pub repository: String,
    pub title: String,
    /// Head commit SHA, used for blob links.
    pub commit: String,
    /// Base branch name.
    pub base: String,
    /// Head branch name.
    pub head: String,
    /// Base commit SHA the baseline report was produced from.
    pub base_commit: String,
    /// Path prefix stripped from report paths (usually the workspace root).
    pub prefix: String,
    /// Directory, relative to the repository root, the report paths are relative to.
    pub working_dir: String,
    /// Web host for blob links.
    pub server_url: String,
    pub should_filter_changed_files: bool,
    /// Repository-relative paths changed by the pull request.
    pub changed_files: Option<BTreeSet<String>>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            repository: String::new(),
            title: String::new(),
            commit: String::new(),
            base: String::new(),
            head: String::new(),
            base_commit: String::new(),
            prefix: String::new(),
            working_dir: "./".to_string(),
            server_url: "https://github.com".to_string(),
            should_filter_changed_files: false,
            changed_files: None,
        }
    }
}

/// Percentage-point differences between two summaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDeltas {
    pub lines: f64,
    pub functions: f64,
    pub branches: f64,
}

impl MetricDeltas {
    #[must_use]
    pub fn between(current: &CoverageSummary, baseline: &CoverageSummary) -> Self {
        Self {
            lines: current.line_pct() - baseline.line_pct(),
            functions: current.function_pct() - baseline.function_pct(),
            branches: current.branch_pct() - baseline.branch_pct(),
        }
    }
}

/// How a file compares with the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    /// No baseline report was supplied.
    NotAvailable,
    /// The file does not appear in the baseline.
    NewFile,
    Changed(MetricDeltas),
}

/// Direction of a coverage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    /// Classify a delta by sign; a missing delta is neutral.
    #[must_use]
    pub fn classify(delta: Option<f64>) -> Self {
        match delta {
            Some(d) if d > 0.0 => Trend::Up,
            Some(d) if d < 0.0 => Trend::Down,
            _ => Trend::Neutral,
        }
    }

    #[must_use]
    pub fn marker(&self) -> &'static str {
        match self {
            Trend::Up => "\u{1F4C8}",
            Trend::Down => "\u{1F4C9}",
            Trend::Neutral => "\u{2796}",
        }
    }
}

/// One row of the per-file table.
#[derive(Debug, Clone)]
pub struct FileRow {
    /// Repository-relative path.
    pub path: String,
    pub summary: CoverageSummary,
    pub delta: Delta,
    pub uncovered_lines: Vec<u32>,
    pub instrumented_lines: Vec<u32>,
}

/// Aggregated coverage data, ready to be formatted.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub title: String,
    pub head: String,
    pub base: String,
    pub base_commit: String,
    /// `<server>/<repository>/blob/<commit>`, when both are known.
    pub blob_url: Option<String>,
    /// Whether the table was restricted to changed files.
    pub filtered: bool,
    /// Retained files in report order.
    pub files: Vec<FileRow>,
    /// Totals over the retained files.
    pub totals: CoverageSummary,
    /// Totals over every baseline file, filtered or not.
    pub baseline_totals: Option<CoverageSummary>,
    /// Changed paths that matched no file in the current report.
    pub unmatched_changed_files: usize,
}

impl CoverageReport {
    /// Change in total coverage, when a baseline is present.
    #[must_use]
    pub fn total_delta(&self) -> Option<MetricDeltas> {
        self.baseline_totals
            .as_ref()
            .map(|base| MetricDeltas::between(&self.totals, base))
    }

    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }
}

/// Build a [`CoverageReport`] from parsed snapshots.
///
/// Totals are asymmetric on purpose: the current side only sums the files
/// retained by the changed-file filter while the baseline side sums the whole
/// baseline report.
pub fn build_report(
    current: &CoverageSnapshot,
    baseline: Option<&CoverageSnapshot>,
    options: &DiffOptions,
) -> CoverageReport {
    let repo_path = |p: &str| path::repo_relative(p, &options.prefix, &options.working_dir);

    let filter = if options.should_filter_changed_files {
        options.changed_files.as_ref()
    } else {
        None
    };

    let mut baseline_index: HashMap<String, CoverageSummary> = HashMap::new();
    if let Some(baseline) = baseline {
        for file in &baseline.files {
            baseline_index
                .entry(repo_path(&file.path))
                .or_insert_with(|| file.summary());
        }
    }

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut files = Vec::new();
    for file in &current.files {
        let path = repo_path(&file.path);
        seen.insert(path.clone());
        if let Some(changed) = filter {
            if !changed.contains(&path) {
                continue;
            }
        }

        let summary = file.summary();
        let delta = match baseline {
            None => Delta::NotAvailable,
            Some(_) => match baseline_index.get(&path) {
                Some(base) => Delta::Changed(MetricDeltas::between(&summary, base)),
                None => Delta::NewFile,
            },
        };

        files.push(FileRow {
            path,
            summary,
            delta,
            uncovered_lines: file.uncovered_lines(),
            instrumented_lines: file.instrumented_lines(),
        });
    }

    let unmatched_changed_files = filter
        .map(|changed| changed.iter().filter(|p| !seen.contains(*p)).count())
        .unwrap_or(0);
    if unmatched_changed_files > 0 {
        debug!(
            unmatched = unmatched_changed_files,
            "changed files without coverage data"
        );
    }

    let blob_url = if options.repository.is_empty() || options.commit.is_empty() {
        None
    } else {
        Some(format!(
            "{}/{}/blob/{}",
            options.server_url.trim_end_matches('/'),
            options.repository,
            options.commit
        ))
    };

    let title = if options.title.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        options.title.trim().to_string()
    };

    CoverageReport {
        title,
        head: options.head.clone(),
        base: options.base.clone(),
        base_commit: options.base_commit.clone(),
        blob_url,
        filtered: filter.is_some(),
        totals: files.iter().map(|f| f.summary).sum(),
        files,
        baseline_totals: baseline.map(CoverageSnapshot::summary),
        unmatched_changed_files,
    }
}

/// Render the Markdown report for `current`, compared with `baseline` when
/// one is given.
pub fn diff(
    current: &CoverageSnapshot,
    baseline: Option<&CoverageSnapshot>,
    options: &DiffOptions,
) -> String {
    build_report(current, baseline, options).format(&MarkdownFormatter)
}

/// Trait for formatting coverage reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &CoverageReport) -> String;
}

/// Markdown formatter, for job summaries and pull request comments.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &CoverageReport) -> String {
        let mut md = String::new();
        let title = &report.title;
        writeln!(md, "## {title}\n").unwrap();

        if !report.head.is_empty() && !report.base.is_empty() {
            let head = &report.head;
            let base = &report.base;
            writeln!(md, "Coverage after merging **{head}** into **{base}** will be\n").unwrap();
        } else {
            md.push_str("Coverage for this commit\n\n");
        }

        let total_delta = report.total_delta();
        let total = format_pct(report.totals.line_pct());
        let marker = Trend::classify(total_delta.map(|d| d.lines)).marker();
        write!(md, "#### Total coverage: {total} {marker}").unwrap();
        if let Some(delta) = total_delta {
            write!(md, " {}", format_delta(delta.lines)).unwrap();
        }
        md.push_str("\n\n");

        md.push_str("| | Covered | Total | Coverage | \u{0394} |\n");
        md.push_str("|:--|--:|--:|--:|--:|\n");
        let totals = &report.totals;
        let rows = [
            (
                "Lines",
                totals.lines_hit,
                totals.lines_found,
                totals.line_pct(),
                total_delta.map(|d| d.lines),
            ),
            (
                "Functions",
                totals.functions_hit,
                totals.functions_found,
                totals.function_pct(),
                total_delta.map(|d| d.functions),
            ),
            (
                "Branches",
                totals.branches_hit,
                totals.branches_found,
                totals.branch_pct(),
                total_delta.map(|d| d.branches),
            ),
        ];
        for (label, hit, found, pct, delta) in rows {
            let delta = delta.map_or_else(|| "N/A".to_string(), format_delta);
            writeln!(md, "| {label} | {hit} | {found} | {} | {delta} |", format_pct(pct)).unwrap();
        }

        let summary = if report.filtered {
            "Coverage Report for Changed Files"
        } else {
            "Coverage Report"
        };
        writeln!(md, "\n<details>\n<summary>{summary}</summary>\n").unwrap();
        md.push_str("| File | Lines | \u{0394} | Functions | Branches | Uncovered Lines |\n");
        md.push_str("|:-----|------:|--:|----------:|---------:|:----------------|\n");

        for f in &report.files {
            let file = match report.blob_url {
                Some(ref blob) => format!("[{}]({blob}/{})", escape_cell(&f.path), f.path),
                None => format!("`{}`", escape_cell(&f.path)),
            };
            let delta = match f.delta {
                Delta::NotAvailable => "N/A".to_string(),
                Delta::NewFile => "\u{1F195} new file".to_string(),
                Delta::Changed(d) => format_delta(d.lines),
            };
            let file_url = report
                .blob_url
                .as_ref()
                .map(|blob| format!("{blob}/{}", f.path));
            let uncovered =
                format_line_ranges(&f.uncovered_lines, &f.instrumented_lines, file_url.as_deref());
            writeln!(
                md,
                "| {file} | {} | {delta} | {} | {} | {uncovered} |",
                format_pct(f.summary.line_pct()),
                format_pct(f.summary.function_pct()),
                format_pct(f.summary.branch_pct()),
            )
            .unwrap();
        }

        if report.files.is_empty() {
            md.push_str("\n_No covered files to report._\n");
        }
        md.push_str("\n</details>\n");

        if report.baseline_totals.is_some() && !report.base_commit.is_empty() {
            let sha = short_sha(&report.base_commit);
            writeln!(md, "\n<sub>Compared with base commit `{sha}`</sub>").unwrap();
        }

        md
    }
}

/// Plain text formatter, for terminals.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &CoverageReport) -> String {
        let mut out = String::new();
        writeln!(out, "{}", report.title).unwrap();

        let total_delta = report.total_delta();
        write!(out, "Total coverage: {}", format_pct(report.totals.line_pct())).unwrap();
        if let Some(delta) = total_delta {
            write!(out, " ({})", format_delta(delta.lines)).unwrap();
        }
        out.push('\n');

        let totals = &report.totals;
        writeln!(
            out,
            "Lines:      {}/{} ({})",
            totals.lines_hit,
            totals.lines_found,
            format_pct(totals.line_pct())
        )
        .unwrap();
        if totals.functions_found > 0 {
            writeln!(
                out,
                "Functions:  {}/{} ({})",
                totals.functions_hit,
                totals.functions_found,
                format_pct(totals.function_pct())
            )
            .unwrap();
        }
        if totals.branches_found > 0 {
            writeln!(
                out,
                "Branches:   {}/{} ({})",
                totals.branches_hit,
                totals.branches_found,
                format_pct(totals.branch_pct())
            )
            .unwrap();
        }

        if report.files.is_empty() {
            return out;
        }

        out.push('\n');
        for f in &report.files {
            let path = &f.path;
            let pct = format_pct(f.summary.line_pct());
            write!(out, "  {path}  {pct}").unwrap();
            match f.delta {
                Delta::NotAvailable => {}
                Delta::NewFile => out.push_str("  (new file)"),
                Delta::Changed(d) => write!(out, "  ({})", format_delta(d.lines)).unwrap(),
            }
            if !f.uncovered_lines.is_empty() {
                let missed = format_line_ranges(&f.uncovered_lines, &f.instrumented_lines, None);
                write!(out, "  uncovered: {missed}").unwrap();
            }
            out.push('\n');
        }

        out
    }
}

/// Format a percentage with at most two decimals, e.g. `50%`, `66.67%`.
#[must_use]
pub fn format_pct(value: f64) -> String {
    let mut s = format!("{value:.2}");
    if s.contains('.') {
        s.truncate(s.trim_end_matches('0').trim_end_matches('.').len());
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s.push('%');
    s
}

/// Format a delta with an explicit sign when positive, e.g. `+12.5%`.
#[must_use]
pub fn format_delta(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", format_pct(value))
    } else {
        format_pct(value)
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Maximum number of consecutive non-instrumented lines that can be bridged
/// when coalescing uncovered ranges.
const MAX_BRIDGE_GAP: u32 = 2;

/// Coalesce sorted line numbers into `(start, end)` ranges, bridging small
/// gaps where every line in the gap is non-instrumented.
///
/// Both `lines` and `instrumented` must be sorted and deduplicated.
#[must_use]
pub fn coalesce_ranges(lines: &[u32], instrumented: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut start = first;
    let mut end = first;

    for &line in rest {
        let gap = line.saturating_sub(end).saturating_sub(1);
        if gap <= MAX_BRIDGE_GAP
            && (end + 1..line).all(|l| instrumented.binary_search(&l).is_err())
        {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }

    ranges.push((start, end));
    ranges
}

/// Format uncovered lines into compact range notation, e.g. "1, 3-5, 8".
///
/// With a `file_url`, each range links to the lines in the blob view.
#[must_use]
pub fn format_line_ranges(lines: &[u32], instrumented: &[u32], file_url: Option<&str>) -> String {
    coalesce_ranges(lines, instrumented)
        .iter()
        .map(|&(start, end)| match (file_url, start == end) {
            (Some(url), true) => format!("[{start}]({url}#L{start})"),
            (Some(url), false) => format!("[{start}-{end}]({url}#L{start}-L{end})"),
            (None, true) => start.to_string(),
            (None, false) => format!("{start}-{end}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
