#![no_main]

use libfuzzer_sys::fuzz_target;
use perflog::engine::{FunctionSite, TimingRecord};
use perflog::report::render_function_report;
use std::time::Duration;

fuzz_target!(|data: &[u8]| {
    // Interpret the input as (line, nanoseconds) pairs; rendering must not
    // panic whatever the accumulated record contains.
    let mut record = TimingRecord::default();
    for chunk in data.chunks_exact(12) {
        let line = u32::from_le_bytes(chunk[0..4].try_into().unwrap());
        let nanos = u64::from_le_bytes(chunk[4..12].try_into().unwrap());
        record.charge(line, Duration::from_nanos(nanos));
    }

    let site = FunctionSite::new("fuzz/target.rs", 1, "fuzzed_fn");
    let mut out = Vec::new();
    let _ = render_function_report(&site, &record, 1e-9, &mut out);
});
