//! Shim context and one-time initialization
//!
//! [`Shim`] is the explicitly constructed context every wrapper call runs
//! against: the resolved process label, the per-process log directory, the
//! shared timing engine and the prefix-selected function set. [`ShimCell`]
//! latches its construction so the one-time sequence {resolve label → ensure
//! directory → construct engine → select functions} executes exactly once
//! per process, even under concurrent first touch from multiple threads: no
//! thread observes the cell as initialized before the sequence has fully
//! completed, and no two threads can ever construct two competing engines.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::engine::{LineTimingEngine, TimingEngine};
use crate::log_dir;
use crate::process_name;
use crate::registry::FunctionTable;

/// Default base path for per-process log directories
pub const DEFAULT_LOG_ROOT: &str = "performance_log";

/// Handling of report-append failures inside a wrapped call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Log a warning, skip the report, still return the business result
    #[default]
    FailOpen,
    /// Propagate the append failure as a fatal error out of the wrapped call
    FailClosed,
}

/// Static configuration, fixed before first use.
///
/// There is no command-line or environment surface; hosts construct this in
/// code (usually inside an `instrument_module!` invocation).
#[derive(Debug, Clone)]
pub struct ShimConfig {
    /// Base path under which one directory per process label is created
    pub log_root: PathBuf,
    /// Only functions whose name starts with this prefix are instrumented;
    /// `None` instruments every registered function
    pub name_prefix: Option<String>,
    /// What a failed report append does to the wrapped call
    pub write_policy: WritePolicy,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            log_root: PathBuf::from(DEFAULT_LOG_ROOT),
            name_prefix: None,
            write_policy: WritePolicy::default(),
        }
    }
}

/// Process-wide instrumentation context
#[derive(Debug)]
pub struct Shim {
    label: String,
    log_dir: PathBuf,
    engine: Box<dyn TimingEngine>,
    selected: BTreeSet<&'static str>,
    write_policy: WritePolicy,
}

impl Shim {
    /// Run the one-time initialization sequence and build the context.
    ///
    /// Directory creation failure does not abort initialization: the shim is
    /// built anyway and the first report append fails loudly through the
    /// write policy.
    pub fn initialize(config: ShimConfig, table: &FunctionTable) -> Self {
        Self::with_engine(config, table, Box::new(LineTimingEngine::new()))
    }

    /// Initialization with a caller-supplied engine implementation
    pub fn with_engine(
        config: ShimConfig,
        table: &FunctionTable,
        engine: Box<dyn TimingEngine>,
    ) -> Self {
        let label = process_name::resolve_process_label();
        let log_dir = config.log_root.join(&label);
        log_dir::ensure_directory(&log_dir);
        let selected = table.select(config.name_prefix.as_deref());
        tracing::debug!(
            %label,
            log_dir = %log_dir.display(),
            registered = table.len(),
            instrumented = selected.len(),
            "instrumentation shim initialized"
        );
        Self {
            label,
            log_dir,
            engine,
            selected,
            write_policy: config.write_policy,
        }
    }

    /// The resolved process label keying the log directory
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Directory the per-function log files live in
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// The shared timing engine. Thread safety of concurrent records is the
    /// engine's own contract; the shim funnels every wrapper through it.
    pub fn engine(&self) -> &dyn TimingEngine {
        self.engine.as_ref()
    }

    /// Whether the prefix filter selected `name` for instrumentation
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// Names selected for instrumentation
    pub fn selected(&self) -> &BTreeSet<&'static str> {
        &self.selected
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }
}

/// Do-once latch around [`Shim`] construction.
///
/// A `const`-constructible cell the generated module holds in a `static`.
/// The first thread through [`ShimCell::get_or_init`] runs the
/// initialization sequence while competitors block; everyone then observes
/// the same fully constructed context for the rest of the process lifetime.
#[derive(Debug, Default)]
pub struct ShimCell {
    inner: OnceLock<Shim>,
}

impl ShimCell {
    /// Create an empty, unlatched cell
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Return the process-wide shim, running the one-time initialization on
    /// first touch. Both closures are evaluated at most once per process.
    pub fn get_or_init(
        &self,
        config: impl FnOnce() -> ShimConfig,
        table: impl FnOnce() -> FunctionTable,
    ) -> &Shim {
        self.inner
            .get_or_init(|| Shim::initialize(config(), &table()))
    }

    /// The shim if initialization already ran
    pub fn get(&self) -> Option<&Shim> {
        self.inner.get()
    }
}

/// Install a `tracing` fmt subscriber writing to stderr, filtered by
/// `RUST_LOG`, for host processes that have none of their own.
///
/// Never called implicitly; returns an error if a global subscriber is
/// already set.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
