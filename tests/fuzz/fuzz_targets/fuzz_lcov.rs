#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // LCOV parser must not panic on any input, and recomputed metrics must
    // stay consistent.
    if let Ok(snapshot) = lcov_reporter::parsers::lcov::parse(data) {
        for file in &snapshot.files {
            let summary = file.summary();
            assert!(summary.lines_hit <= summary.lines_found);
        }
    }
});
