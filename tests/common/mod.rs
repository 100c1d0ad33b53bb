#![allow(dead_code)]

use std::collections::BTreeSet;

use lcov_reporter::model::CoverageSnapshot;
use lcov_reporter::report::DiffOptions;

/// Workspace root the fixture reports were generated under.
pub const WORKSPACE_PREFIX: &str = "/home/runner/work/app/app/";

/// Parse a file from `tests/fixtures`.
pub fn fixture(name: &str) -> CoverageSnapshot {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let raw = std::fs::read(&path).unwrap();
    lcov_reporter::parsers::lcov::parse(&raw).unwrap()
}

/// Options for a pull request from `feature` into `main`.
pub fn pr_options() -> DiffOptions {
    DiffOptions {
        repository: "acme/app".to_string(),
        commit: "1111111aaaaaaa".to_string(),
        head: "feature".to_string(),
        base: "main".to_string(),
        base_commit: "2222222bbbbbbb".to_string(),
        prefix: WORKSPACE_PREFIX.to_string(),
        ..Default::default()
    }
}

pub fn changed(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}
