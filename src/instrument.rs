//! Per-call instrumentation pipeline
//!
//! [`observe`] is the body of every generated wrapper. A call flows through
//! four steps: re-register the site with the engine (idempotent), invoke the
//! original with the received arguments, record the elapsed time, then append
//! a fresh cumulative report to the function's log file. The wrapper is
//! behaviorally transparent: the return value passes through untouched, and
//! a panic in the original unwinds straight through with the timing and
//! report steps skipped.
//!
//! Call frames are thread-local. A target function may opt into real
//! intra-function line resolution by placing [`crate::mark!`] checkpoints;
//! each mark charges the time elapsed since the previous checkpoint to its
//! own source line, and the remainder of the call is charged to the
//! function's registration line.

use std::cell::RefCell;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::engine::FunctionSite;
use crate::log_dir;
use crate::report;
use crate::shim::{Shim, WritePolicy};

/// A failed report append, carrying the log file path
#[derive(Debug, Error)]
#[error("failed to append timing report to {}: {source}", .path.display())]
pub struct WriteError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// In-flight instrumented call on the current thread
struct Frame {
    last_mark: Instant,
    pending: Vec<(u32, Duration)>,
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame on unwind so a panicking call never leaves a stale frame
/// behind on this thread.
struct FrameGuard {
    finished: bool,
}

impl FrameGuard {
    fn push() -> Self {
        FRAMES.with(|frames| {
            frames.borrow_mut().push(Frame {
                last_mark: Instant::now(),
                pending: Vec::new(),
            });
        });
        Self { finished: false }
    }

    fn finish(mut self) -> Vec<(u32, Duration)> {
        self.finished = true;
        FRAMES
            .with(|frames| frames.borrow_mut().pop())
            .map(|frame| frame.pending)
            .unwrap_or_default()
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if !self.finished {
            FRAMES.with(|frames| {
                frames.borrow_mut().pop();
            });
        }
    }
}

/// Charge the time since the previous checkpoint to `line` of the innermost
/// active call frame. A no-op outside any instrumented call.
pub fn mark(line: u32) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        if let Some(frame) = frames.last_mut() {
            let elapsed = frame.last_mark.elapsed();
            frame.pending.push((line, elapsed));
            frame.last_mark = Instant::now();
        }
    });
}

/// Line checkpoint inside an instrumented function.
///
/// Charges the time elapsed since the previous checkpoint (or the call
/// start) to the current source line. Outside an instrumented call this
/// expands to a no-op.
#[macro_export]
macro_rules! mark {
    () => {
        $crate::instrument::mark(line!())
    };
}

/// Run one instrumented invocation of `f` for `site`.
///
/// Functions the prefix filter did not select pass straight through to the
/// original with no timing side effects. For selected functions the return
/// value is exactly the original's; report-append failures are handled per
/// the shim's [`WritePolicy`].
pub fn observe<R>(shim: &Shim, site: FunctionSite, f: impl FnOnce() -> R) -> R {
    if !shim.is_selected(site.name) {
        return f();
    }

    shim.engine().register(site);
    let guard = FrameGuard::push();
    let started = Instant::now();
    let result = f();
    let elapsed = started.elapsed();
    let marked = guard.finish();

    let marked_total: Duration = marked.iter().map(|(_, spent)| *spent).sum();
    for (line, spent) in marked {
        shim.engine().record(site, line, spent);
    }
    shim.engine()
        .record(site, site.line, elapsed.saturating_sub(marked_total));
    tracing::trace!(
        target: "perflog",
        function = site.name,
        ?elapsed,
        "instrumented call finished"
    );

    if let Err(err) = append_report(shim, site) {
        match shim.write_policy() {
            WritePolicy::FailOpen => {
                tracing::warn!(
                    target: "perflog",
                    function = site.name,
                    %err,
                    "skipping timing report append"
                );
            }
            WritePolicy::FailClosed => panic!("{err}"),
        }
    }

    result
}

/// Append the cumulative report for `site` to its per-function log file.
///
/// A snapshot miss is the normal "nothing recorded yet" case and appends
/// nothing. Each successful append is a full fresh snapshot, so the file
/// accumulates overlapping cumulative reports over the process lifetime.
fn append_report(shim: &Shim, site: FunctionSite) -> Result<(), WriteError> {
    let snapshot = shim.engine().snapshot();
    let Some(record) = snapshot.timing_for(&site) else {
        return Ok(());
    };

    let path = shim.log_dir().join(site.name);
    let file = log_dir::append_handle(&path).map_err(|source| WriteError {
        path: path.clone(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    report::render_function_report(&site, record, snapshot.unit(), &mut out)
        .and_then(|()| out.flush())
        .map_err(|source| WriteError { path, source })
}
