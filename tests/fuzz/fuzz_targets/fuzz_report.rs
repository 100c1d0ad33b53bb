#![no_main]
use libfuzzer_sys::fuzz_target;

use lcov_reporter::report::{diff, DiffOptions};

fuzz_target!(|data: &[u8]| {
    // Split the input into a current and a baseline report; rendering must
    // never panic.
    let mid = data.len() / 2;
    let current = lcov_reporter::parsers::lcov::parse(&data[..mid]);
    let baseline = lcov_reporter::parsers::lcov::parse(&data[mid..]);
    if let (Ok(current), Ok(baseline)) = (current, baseline) {
        let _ = diff(&current, Some(&baseline), &DiffOptions::default());
    }
});
