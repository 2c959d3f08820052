//! Legacy `.name.icloud` placeholder files.
//!
//! Older iCloud Drive releases replaced an evicted `song.mp3` with a hidden
//! `.song.mp3.icloud` stub next to it. The original path then no longer
//! exists, so the stub itself is the evidence of eviction.

use std::path::{Path, PathBuf};

const SUFFIX: &str = ".icloud";

/// Path of the sidecar that would stand in for `path`.
pub fn sidecar_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    Some(path.with_file_name(format!(".{name}{SUFFIX}")))
}

/// Returns true if `path` is gone and its sidecar is present.
pub fn is_evicted_by_sidecar(path: &Path) -> bool {
    !path.exists() && sidecar_path(path).is_some_and(|s| s.is_file())
}

/// Map a sidecar back to the file it represents.
///
/// Returns `None` if `path` does not follow the `.name.icloud` convention.
pub fn original_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let inner = name.strip_prefix('.')?.strip_suffix(SUFFIX)?;
    if inner.is_empty() {
        return None;
    }
    Some(path.with_file_name(inner))
}
