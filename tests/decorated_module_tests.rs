//! End-to-end tests for a decorated target module
//!
//! Mirrors the operator scenario: a business module exposes `module_`
//! functions plus a helper, the decorated copy instruments only the prefixed
//! ones, and every successful call appends one cumulative report to the
//! function's own log file under the per-process directory.

use serial_test::serial;
use std::path::PathBuf;

mod target {
    use std::thread;
    use std::time::Duration;

    pub fn module_add_two(value: i64) -> (i32, i64) {
        (0, value + 2)
    }

    pub fn module_do_long_work() {
        thread::sleep(Duration::from_millis(20));
    }

    pub fn helper_scratch(value: i64) -> i64 {
        value * 3
    }
}

mod decorated {
    use super::target;

    perflog::instrument_module! {
        target: target,
        config: perflog::shim::ShimConfig {
            log_root: std::env::temp_dir()
                .join(format!("perflog_decorated_{}", std::process::id())),
            name_prefix: Some("module_".to_string()),
            write_policy: perflog::shim::WritePolicy::FailOpen,
        },
        functions: {
            fn module_add_two(value: i64) -> (i32, i64);
            fn module_do_long_work();
            fn helper_scratch(value: i64) -> i64;
        }
    }
}

fn log_path(name: &str) -> PathBuf {
    decorated::shim().log_dir().join(name)
}

fn report_count(name: &str) -> usize {
    std::fs::read_to_string(log_path(name))
        .unwrap_or_default()
        .matches("Timer unit:")
        .count()
}

#[test]
#[serial]
fn test_decorated_call_returns_original_result() {
    assert_eq!(decorated::module_add_two(4), (0, 6));
    assert_eq!(decorated::module_add_two(4), target::module_add_two(4));
}

#[test]
#[serial]
fn test_each_successful_call_appends_one_report() {
    let before = report_count("module_add_two");
    decorated::module_add_two(1);
    decorated::module_add_two(2);
    assert_eq!(report_count("module_add_two"), before + 2);
}

#[test]
#[serial]
fn test_long_work_writes_its_own_file() {
    let before = report_count("module_do_long_work");
    decorated::module_do_long_work();
    assert_eq!(report_count("module_do_long_work"), before + 1);
}

#[test]
#[serial]
fn test_helper_is_not_instrumented() {
    assert_eq!(decorated::helper_scratch(5), 15);
    assert!(!log_path("helper_scratch").exists());
}

#[test]
#[serial]
fn test_prefix_selection_over_the_table() {
    let table = decorated::function_table();
    assert_eq!(table.len(), 3);

    let shim = decorated::shim();
    assert!(shim.is_selected("module_add_two"));
    assert!(shim.is_selected("module_do_long_work"));
    assert!(!shim.is_selected("helper_scratch"));
}

#[test]
#[serial]
fn test_report_contents_name_the_function() {
    decorated::module_add_two(10);
    let contents = std::fs::read_to_string(log_path("module_add_two")).unwrap();

    assert!(contents.contains("Timer unit: 1e-9 s"));
    assert!(contents.contains("Function: module_add_two at line"));
    assert!(contents.contains("Line Contents"));
}

#[test]
#[serial]
fn test_recorded_time_covers_the_sleep() {
    decorated::module_do_long_work();

    let snapshot = decorated::shim().engine().snapshot();
    let (_, record) = snapshot
        .sites()
        .find(|(site, _)| site.name == "module_do_long_work")
        .expect("long work must have accumulated timing");
    assert!(record.total_time_ns() >= 20_000_000);
}

#[test]
#[serial]
fn test_first_touch_initializes_once() {
    let first: *const perflog::shim::Shim = decorated::shim();
    decorated::module_add_two(0);
    let second: *const perflog::shim::Shim = decorated::shim();
    assert!(std::ptr::eq(first, second));
}

#[test]
#[serial]
fn test_log_directory_is_keyed_by_process_label() {
    let shim = decorated::shim();
    assert!(shim.log_dir().ends_with(shim.label()));
    assert!(shim.log_dir().is_dir());
}

#[test]
#[serial]
fn test_concurrent_callers_all_get_reports() {
    let before = report_count("module_add_two");
    let mut handles = Vec::new();
    for value in 0..4i64 {
        handles.push(std::thread::spawn(move || decorated::module_add_two(value)));
    }
    for (value, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), (0, value as i64 + 2));
    }
    assert_eq!(report_count("module_add_two"), before + 4);
}
