//! Explicit function registration and wrapper generation
//!
//! The shim never reflects over a target module at runtime: the functions it
//! wraps are declared once in an [`instrument_module!`] invocation, which
//! generates a same-name, same-signature wrapper for each and builds the
//! [`FunctionTable`] the decoration step filters. The table is read once at
//! initialization and never mutated afterwards; the target module's own
//! functions stay untouched.

use std::collections::BTreeSet;

use crate::engine::FunctionSite;

/// One registered function of the instrumented module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionEntry {
    /// Site key shared with the timing engine
    pub site: FunctionSite,
}

/// Registration list of every function a generated module exposes
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: Vec<FunctionEntry>,
}

impl FunctionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one function registration
    pub fn register(&mut self, site: FunctionSite) {
        self.entries.push(FunctionEntry { site });
    }

    /// All registered entries, in registration order
    pub fn entries(&self) -> &[FunctionEntry] {
        &self.entries
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The decoration step: the set of function names chosen by the prefix
    /// filter. `None` selects every registered function. Membership in the
    /// returned set decides instrument-versus-passthrough at call time.
    pub fn select(&self, prefix: Option<&str>) -> BTreeSet<&'static str> {
        self.entries
            .iter()
            .map(|entry| entry.site.name)
            .filter(|name| prefix.map_or(true, |p| name.starts_with(p)))
            .collect()
    }
}

/// Generate an instrumented copy of a target module.
///
/// `target` names the original module, brought into scope of the invoking
/// module with a `use`. For every listed function signature this expands to
/// a `pub fn` with the identical name, arguments and return type that
/// delegates to the target function through [`crate::instrument::observe`],
/// plus:
///
/// - `function_table()`: the [`FunctionTable`] registering every wrapper,
/// - `shim()`: the process-wide [`crate::shim::Shim`] behind the wrappers,
///   lazily initialized on first touch from the given config expression.
///
/// Callers importing the invoking module transparently receive instrumented
/// behavior; functions not listed are not exposed, and listed functions that
/// the config's name prefix does not select execute the original directly
/// with no timing side effects.
///
/// # Usage
///
/// ```ignore
/// mod decorated {
///     use crate::business;
///
///     perflog::instrument_module! {
///         target: business,
///         config: perflog::shim::ShimConfig {
///             name_prefix: Some("module_".to_string()),
///             ..Default::default()
///         },
///         functions: {
///             fn module_add_two(value: i64) -> (i32, i64);
///             fn module_do_long_work();
///         }
///     }
/// }
/// ```
#[macro_export]
macro_rules! instrument_module {
    (
        target: $target:ident,
        config: $config:expr,
        functions: {
            $( fn $name:ident ( $($arg:ident : $ty:ty),* $(,)? ) $(-> $ret:ty)? ; )*
        }
    ) => {
        static __PERFLOG_SHIM: $crate::shim::ShimCell = $crate::shim::ShimCell::new();

        /// Registration table of every function this module wraps
        pub fn function_table() -> $crate::registry::FunctionTable {
            let mut table = $crate::registry::FunctionTable::new();
            $(
                table.register($crate::engine::FunctionSite::new(
                    file!(),
                    line!(),
                    stringify!($name),
                ));
            )*
            table
        }

        /// The process-wide shim behind this module's wrappers
        pub fn shim() -> &'static $crate::shim::Shim {
            __PERFLOG_SHIM.get_or_init(|| $config, function_table)
        }

        $(
            pub fn $name($($arg: $ty),*) $(-> $ret)? {
                static __SITE: $crate::engine::FunctionSite = $crate::engine::FunctionSite::new(
                    file!(),
                    line!(),
                    stringify!($name),
                );
                $crate::instrument::observe(shim(), __SITE, move || {
                    $target::$name($($arg),*)
                })
            }
        )*
    };
}
