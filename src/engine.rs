//! Line timing accumulation engine
//!
//! The engine owns every timing record collected in this process. Records are
//! keyed by [`FunctionSite`] (source file, starting line, function name) so
//! that re-registering an already-known function accumulates into the same
//! history instead of duplicating it.
//!
//! The instrumentation core only depends on the [`TimingEngine`] trait; the
//! default [`LineTimingEngine`] implementation accumulates per-line hit
//! counts and elapsed nanoseconds behind a mutex and hands out cloned
//! snapshots.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Identity of an instrumented function: where it was registered and what it
/// is called. The engine's accumulation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionSite {
    /// Source file the wrapper was generated in
    pub file: &'static str,
    /// Starting line of the registration
    pub line: u32,
    /// Function name, unique within one instrumented module
    pub name: &'static str,
}

impl FunctionSite {
    /// Create a function site key
    pub const fn new(file: &'static str, line: u32, name: &'static str) -> Self {
        Self { file, line, name }
    }
}

/// Accumulated hits and elapsed time for a single source line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounter {
    /// Number of times the line was charged
    pub hits: u64,
    /// Total elapsed time charged to the line (nanoseconds)
    pub total_time_ns: u64,
}

/// Accumulated per-line timing rows for one function site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingRecord {
    lines: BTreeMap<u32, LineCounter>,
}

impl TimingRecord {
    /// Charge one hit of `elapsed` against `line`. Totals saturate instead
    /// of wrapping; records live for the whole process and are never reset.
    pub fn charge(&mut self, line: u32, elapsed: Duration) {
        let counter = self.lines.entry(line).or_default();
        counter.hits = counter.hits.saturating_add(1);
        counter.total_time_ns = counter
            .total_time_ns
            .saturating_add(elapsed.as_nanos() as u64);
    }

    /// Rows in ascending line order
    pub fn lines(&self) -> impl Iterator<Item = (u32, &LineCounter)> {
        self.lines.iter().map(|(line, counter)| (*line, counter))
    }

    /// Total time across all lines (nanoseconds)
    pub fn total_time_ns(&self) -> u64 {
        self.lines
            .values()
            .fold(0u64, |acc, c| acc.saturating_add(c.total_time_ns))
    }

    /// Total hits across all lines
    pub fn total_hits(&self) -> u64 {
        self.lines.values().map(|c| c.hits).sum()
    }

    /// True if no line has been charged yet
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Point-in-time copy of everything the engine has recorded so far
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    timings: HashMap<FunctionSite, TimingRecord>,
    unit: f64,
}

impl StatsSnapshot {
    /// Timing rows for one site, `None` if the site never recorded anything
    pub fn timing_for(&self, site: &FunctionSite) -> Option<&TimingRecord> {
        self.timings.get(site).filter(|record| !record.is_empty())
    }

    /// Every site with its accumulated rows, in unspecified order
    pub fn sites(&self) -> impl Iterator<Item = (&FunctionSite, &TimingRecord)> {
        self.timings.iter()
    }

    /// Seconds per recorded tick, for display scaling
    pub fn unit(&self) -> f64 {
        self.unit
    }

    /// Number of sites the engine knows about
    pub fn len(&self) -> usize {
        self.timings.len()
    }

    /// True if nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }
}

/// The timing capability the instrumentation core runs against.
///
/// Implementations must be safe to share across worker threads: every wrapped
/// function in the process funnels its records into the one engine instance.
pub trait TimingEngine: std::fmt::Debug + Send + Sync {
    /// Make `site` known to the engine. Idempotent: registering a site that
    /// already has accumulated history must not disturb that history.
    fn register(&self, site: FunctionSite);

    /// Accumulate one hit of `elapsed` against `line` of `site`
    fn record(&self, site: FunctionSite, line: u32, elapsed: Duration);

    /// Capture all timing recorded so far across every registered site
    fn snapshot(&self) -> StatsSnapshot;
}

/// Default engine: per-line wall-clock accumulation with nanosecond ticks
#[derive(Debug, Default)]
pub struct LineTimingEngine {
    timings: Mutex<HashMap<FunctionSite, TimingRecord>>,
}

/// Seconds per tick recorded by [`LineTimingEngine`]
const TIMER_UNIT: f64 = 1e-9;

impl LineTimingEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimingEngine for LineTimingEngine {
    fn register(&self, site: FunctionSite) {
        let mut timings = self.timings.lock().unwrap_or_else(PoisonError::into_inner);
        timings.entry(site).or_default();
    }

    fn record(&self, site: FunctionSite, line: u32, elapsed: Duration) {
        let mut timings = self.timings.lock().unwrap_or_else(PoisonError::into_inner);
        timings.entry(site).or_default().charge(line, elapsed);
    }

    fn snapshot(&self) -> StatsSnapshot {
        let timings = self.timings.lock().unwrap_or_else(PoisonError::into_inner);
        StatsSnapshot {
            timings: timings.clone(),
            unit: TIMER_UNIT,
        }
    }
}
