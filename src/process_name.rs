//! Process identity resolution
//!
//! Log directories are keyed by a human-readable label for the running
//! process. The label comes from the OS process table (`ps -q <pid> -o
//! comm=`); when that query fails for any reason the decimal pid stands in,
//! so resolution itself never fails. The query spawns one subprocess and is
//! expected to run exactly once per process lifetime.

use std::process::Command;

/// Resolve a stable, human-readable label for the current process.
///
/// Returns the OS-reported command name, or the decimal pid string when the
/// process-table query fails.
pub fn resolve_process_label() -> String {
    let pid = std::process::id();
    resolve_with(pid, query_command_name)
}

fn resolve_with(pid: u32, query: impl FnOnce(u32) -> Option<String>) -> String {
    match query(pid) {
        Some(name) => name,
        None => {
            tracing::debug!(pid, "process name lookup failed, falling back to pid");
            pid.to_string()
        }
    }
}

/// Query the process table for the command name of `pid`.
///
/// Any failure mode collapses to `None`: spawn error, non-success exit,
/// output on stderr, or empty/non-UTF-8 stdout.
fn query_command_name(pid: u32) -> Option<String> {
    let output = Command::new("ps")
        .args(["-q", &pid.to_string(), "-o", "comm="])
        .output()
        .ok()?;
    if !output.status.success() || !output.stderr.is_empty() {
        return None;
    }
    let name = String::from_utf8(output.stdout).ok()?;
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_to_pid_when_query_fails() {
        let label = resolve_with(4242, |_| None);
        assert_eq!(label, "4242");
    }

    #[test]
    fn test_query_result_wins_over_pid() {
        let label = resolve_with(4242, |_| Some("worker".to_string()));
        assert_eq!(label, "worker");
    }

    #[test]
    fn test_resolve_never_returns_empty() {
        // Whatever the host environment reports, the label is usable as a
        // directory name component.
        let label = resolve_process_label();
        assert!(!label.is_empty());
        assert!(!label.contains('/'));
    }

    #[test]
    fn test_query_rejects_empty_output() {
        // `ps` with an impossible pid prints nothing; the caller must see
        // `None`, not an empty label.
        let result = query_command_name(u32::MAX);
        assert!(result.is_none());
    }
}
