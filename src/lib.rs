//! Perflog - drop-in instrumentation shim with per-function timing logs
//!
//! This library substitutes a target module with a decorated copy whose
//! functions are wrapped to collect per-line execution timing. Every call
//! through a wrapper appends a human-readable cumulative report to
//! `<log_root>/<process_label>/<function_name>`, so operators who cannot
//! modify a running process can swap the importable module on disk, trigger
//! a reload, and collect timing logs keyed by the invoking process's name.
//!
//! The wrapped surface is declared once with [`instrument_module!`]; wrappers
//! share a process-wide [`shim::Shim`] context that is lazily initialized
//! exactly once, even under concurrent first touch.

pub mod engine;
pub mod instrument;
pub mod log_dir;
pub mod process_name;
pub mod registry;
pub mod report;
pub mod shim;
