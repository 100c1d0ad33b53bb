/// Parser for the LCOV tracefile format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<path to source file>
///   FN:<line>[,<end line>],<function name>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means 0)
///   BRF:<branches found>
///   BRH:<branches hit>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
///
/// Summary records are kept for cross-checking only; all metrics are
/// derived from the detail records.
use super::Parser;
use crate::error::{ReporterError, Result};
use crate::model::*;

/// LCOV format parser.
pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, input: &[u8]) -> Result<CoverageSnapshot> {
        parse(input)
    }
}

/// Parse LCOV data from raw bytes.
///
/// Only input that is not UTF-8 text is an error. Malformed or unknown
/// records are skipped.
pub fn parse(input: &[u8]) -> Result<CoverageSnapshot> {
    let text = std::str::from_utf8(input).map_err(|e| {
        ReporterError::Parse(format!(
            "LCOV data is not valid UTF-8 (at byte {})",
            e.valid_up_to()
        ))
    })?;
    Ok(parse_str(text))
}

/// Parse LCOV data that is already known to be text.
pub fn parse_str(text: &str) -> CoverageSnapshot {
    let mut snapshot = CoverageSnapshot::new();
    let mut current_file: Option<FileCoverage> = None;

    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(file) = current_file.take() {
                snapshot.files.push(file);
            }
            continue;
        }

        // Split on first ':'
        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };

        if tag == "SF" {
            // A section left open by a truncated report is still kept.
            if let Some(file) = current_file.replace(FileCoverage::new(value.to_string())) {
                snapshot.files.push(file);
            }
            continue;
        }

        // Everything else needs an open section.
        let Some(file) = current_file.as_mut() else {
            continue;
        };

        match tag {
            "DA" => {
                if let Some(line) = parse_da(value) {
                    file.lines.push(line);
                }
            }
            "FN" => {
                if let Some(function) = parse_fn(value) {
                    file.functions.push(function);
                }
            }
            "FNDA" => {
                // FNDA:<execution_count>,<function_name>
                if let Some((count_str, name)) = value.split_once(',') {
                    if let Ok(hit_count) = count_str.trim().parse::<u64>() {
                        if let Some(function) = file.functions.iter_mut().find(|f| f.name == name)
                        {
                            function.hit_count = hit_count;
                        }
                    }
                }
            }
            "BRDA" => {
                if let Some(branch) = parse_brda(value) {
                    file.branches.push(branch);
                }
            }
            "LF" => file.reported.lines_found = value.trim().parse().ok(),
            "LH" => file.reported.lines_hit = value.trim().parse().ok(),
            "FNF" => file.reported.functions_found = value.trim().parse().ok(),
            "FNH" => file.reported.functions_hit = value.trim().parse().ok(),
            "BRF" => file.reported.branches_found = value.trim().parse().ok(),
            "BRH" => file.reported.branches_hit = value.trim().parse().ok(),
            // TN, VER, FNL, FNA and anything newer.
            _ => {}
        }
    }

    // Handle case where input ends without end_of_record
    if let Some(file) = current_file.take() {
        snapshot.files.push(file);
    }

    snapshot
}

/// `DA:<line_number>,<execution_count>[,<checksum>]`
///
/// Some instrumenters use negative counts (e.g., -1) to mark
/// non-instrumentable lines; those are skipped entirely.
fn parse_da(value: &str) -> Option<LineCoverage> {
    let mut parts = value.splitn(3, ',');
    let line_number = parts.next()?.trim().parse::<u32>().ok()?;
    let count = parts.next()?.trim().parse::<i64>().ok()?;
    if count < 0 {
        return None;
    }
    Some(LineCoverage {
        line_number,
        hit_count: count as u64,
    })
}

/// `FN:<line>,<name>` or, from LCOV 2.x, `FN:<line>,<end_line>,<name>`.
fn parse_fn(value: &str) -> Option<FunctionCoverage> {
    let (line_str, rest) = value.split_once(',')?;
    let start_line = line_str.trim().parse::<u32>().ok()?;

    let (end_line, name) = match rest.split_once(',') {
        Some((end_str, name)) => match end_str.trim().parse::<u32>() {
            Ok(end) => (Some(end), name),
            // Names may contain commas (C++ templates).
            Err(_) => (None, rest),
        },
        None => (None, rest),
    };
    if name.is_empty() {
        return None;
    }

    Some(FunctionCoverage {
        name: name.to_string(),
        start_line,
        end_line,
        hit_count: 0,
    })
}

/// `BRDA:<line>,<block>,<branch>,<taken>`; `<taken>` of "-" means the
/// branch was never evaluated and counts as 0.
fn parse_brda(value: &str) -> Option<BranchCoverage> {
    let parts: Vec<&str> = value.splitn(4, ',').collect();
    if parts.len() != 4 {
        return None;
    }
    let line_number = parts[0].trim().parse::<u32>().ok()?;
    let hit_count = match parts[3].trim() {
        "-" => 0,
        taken => taken.parse::<u64>().ok()?,
    };
    Some(BranchCoverage {
        line_number,
        block: parts[1].to_string(),
        branch: parts[2].to_string(),
        hit_count,
    })
}
