//! In-memory representation of a parsed LCOV report. The parser produces a
//! `CoverageSnapshot`; every metric the report engine needs is derived from
//! the detail records here rather than from the tool's own summary lines.

use std::iter::Sum;
use std::ops::Add;

/// Coverage percentage in the range 0–100.
///
/// Nothing to cover counts as fully covered, so a file without instrumented
/// lines reads 100% instead of dividing by zero.
#[must_use]
pub fn percentage(hit: u64, found: u64) -> f64 {
    if found == 0 {
        100.0
    } else {
        hit as f64 / found as f64 * 100.0
    }
}

/// A single instrumented line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineCoverage {
    pub line_number: u32,
    pub hit_count: u64,
}

/// One arm of a branch point, as recorded by a `BRDA` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCoverage {
    pub line_number: u32,
    pub block: String,
    pub branch: String,
    pub hit_count: u64,
}

/// A function declared with `FN` and (optionally) counted with `FNDA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCoverage {
    pub name: String,
    pub start_line: u32,
    pub end_line: Option<u32>,
    pub hit_count: u64,
}

/// Summary counters exactly as the coverage tool wrote them
/// (`LF`, `LH`, `FNF`, `FNH`, `BRF`, `BRH`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportedCounts {
    pub lines_found: Option<u64>,
    pub lines_hit: Option<u64>,
    pub functions_found: Option<u64>,
    pub functions_hit: Option<u64>,
    pub branches_found: Option<u64>,
    pub branches_hit: Option<u64>,
}

/// Coverage data for one `SF:` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCoverage {
    pub path: String,
    pub lines: Vec<LineCoverage>,
    pub functions: Vec<FunctionCoverage>,
    pub branches: Vec<BranchCoverage>,
    pub reported: ReportedCounts,
}

impl FileCoverage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Found/hit counts recomputed from the detail records.
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary {
            lines_found: self.lines.len() as u64,
            lines_hit: self.lines.iter().filter(|l| l.hit_count > 0).count() as u64,
            functions_found: self.functions.len() as u64,
            functions_hit: self.functions.iter().filter(|f| f.hit_count > 0).count() as u64,
            branches_found: self.branches.len() as u64,
            branches_hit: self.branches.iter().filter(|b| b.hit_count > 0).count() as u64,
        }
    }

    /// Line numbers with a zero hit count, sorted and deduplicated.
    #[must_use]
    pub fn uncovered_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .lines
            .iter()
            .filter(|l| l.hit_count == 0)
            .map(|l| l.line_number)
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    /// Every instrumented line number, sorted and deduplicated.
    #[must_use]
    pub fn instrumented_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self.lines.iter().map(|l| l.line_number).collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    /// Reported summary counters that disagree with the detail records,
    /// as `(tag, reported, computed)`.
    #[must_use]
    pub fn summary_mismatches(&self) -> Vec<(&'static str, u64, u64)> {
        let computed = self.summary();
        let checks = [
            ("LF", self.reported.lines_found, computed.lines_found),
            ("LH", self.reported.lines_hit, computed.lines_hit),
            ("FNF", self.reported.functions_found, computed.functions_found),
            ("FNH", self.reported.functions_hit, computed.functions_hit),
            ("BRF", self.reported.branches_found, computed.branches_found),
            ("BRH", self.reported.branches_hit, computed.branches_hit),
        ];
        checks
            .into_iter()
            .filter_map(|(tag, reported, computed)| match reported {
                Some(r) if r != computed => Some((tag, r, computed)),
                _ => None,
            })
            .collect()
    }
}

/// The complete result of parsing one LCOV report, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSnapshot {
    pub files: Vec<FileCoverage>,
}

impl CoverageSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals across every file in the snapshot.
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        self.files.iter().map(FileCoverage::summary).sum()
    }
}

/// Found/hit counts for lines, functions and branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub lines_found: u64,
    pub lines_hit: u64,
    pub functions_found: u64,
    pub functions_hit: u64,
    pub branches_found: u64,
    pub branches_hit: u64,
}

impl CoverageSummary {
    #[must_use]
    pub fn line_pct(&self) -> f64 {
        percentage(self.lines_hit, self.lines_found)
    }

    #[must_use]
    pub fn function_pct(&self) -> f64 {
        percentage(self.functions_hit, self.functions_found)
    }

    #[must_use]
    pub fn branch_pct(&self) -> f64 {
        percentage(self.branches_hit, self.branches_found)
    }
}

impl Add for CoverageSummary {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            lines_found: self.lines_found + other.lines_found,
            lines_hit: self.lines_hit + other.lines_hit,
            functions_found: self.functions_found + other.functions_found,
            functions_hit: self.functions_hit + other.functions_hit,
            branches_found: self.branches_found + other.branches_found,
            branches_hit: self.branches_hit + other.branches_hit,
        }
    }
}

impl Sum for CoverageSummary {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
