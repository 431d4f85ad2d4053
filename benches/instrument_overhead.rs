//! Instrumentation overhead benchmarks
//!
//! Measures what a timing wrapper adds on top of a direct call: the
//! passthrough path (prefix filter rejected the function) and the full
//! pipeline (record, snapshot, report append).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use perflog::engine::FunctionSite;
use perflog::instrument::observe;
use perflog::registry::FunctionTable;
use perflog::shim::{Shim, ShimConfig, WritePolicy};

const INSTRUMENTED: FunctionSite =
    FunctionSite::new("benches/instrument_overhead.rs", 1, "module_add_two");
const PASSTHROUGH: FunctionSite =
    FunctionSite::new("benches/instrument_overhead.rs", 2, "helper_scratch");

fn add_two(value: i64) -> (i32, i64) {
    (0, value + 2)
}

fn shim_under(root: &std::path::Path) -> Shim {
    let mut table = FunctionTable::new();
    table.register(INSTRUMENTED);
    table.register(PASSTHROUGH);
    Shim::initialize(
        ShimConfig {
            log_root: root.to_path_buf(),
            name_prefix: Some("module_".to_string()),
            write_policy: WritePolicy::FailOpen,
        },
        &table,
    )
}

/// Baseline: the original function with no wrapper
fn bench_direct_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("direct");
    group.bench_function("add_two_native", |b| {
        b.iter(|| black_box(add_two(black_box(4))))
    });
    group.finish();
}

/// Wrapper over an unselected function: selection check only
fn bench_passthrough(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let shim = shim_under(dir.path());

    let mut group = c.benchmark_group("passthrough");
    group.bench_function("add_two_unselected", |b| {
        b.iter(|| black_box(observe(&shim, PASSTHROUGH, || add_two(black_box(4)))))
    });
    group.finish();
}

/// Full pipeline: timing, snapshot and a report append per call
fn bench_instrumented(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let shim = shim_under(dir.path());

    let mut group = c.benchmark_group("instrumented");
    group.sample_size(50);
    group.bench_function("add_two_with_report_append", |b| {
        b.iter(|| black_box(observe(&shim, INSTRUMENTED, || add_two(black_box(4)))))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_direct_call,
    bench_passthrough,
    bench_instrumented
);
criterion_main!(benches);
