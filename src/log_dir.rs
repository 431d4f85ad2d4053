//! Log directory preparation and append-mode file access
//!
//! Directory creation is idempotent and signals failure with a boolean
//! instead of propagating: initialization proceeds without a directory, and
//! the first report append then fails loudly through the write policy.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Create `path` and every missing parent, tolerating "already exists".
///
/// Returns `false` on any OS-level failure (permissions, invalid path,
/// read-only filesystem) instead of raising.
pub fn ensure_directory(path: &Path) -> bool {
    match std::fs::create_dir_all(path) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to create log directory");
            false
        }
    }
}

/// Open `path` for appending, creating it if absent.
///
/// Reports are written through short-lived handles: one open-write-close per
/// instrumented call, no handle held across calls.
pub fn append_handle(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
