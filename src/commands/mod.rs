//! Command implementations. Each module exposes `run`.

pub mod attrs;
pub mod batch;
pub mod diagnose;
pub mod evict;
pub mod find;
pub mod menu;
pub mod music;
pub mod protect;
pub mod status;

use std::path::PathBuf;

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path.trim()).as_ref())
}

/// Directory to search when none is given: the Desktop.
pub fn default_dir() -> PathBuf {
    dirs::desktop_dir().unwrap_or_else(|| expand_path("~/Desktop"))
}

/// Expand `dir`, or fall back to [`default_dir`] when it is missing or blank.
pub fn resolve_dir(dir: Option<&str>) -> PathBuf {
    match dir.map(str::trim) {
        Some(d) if !d.is_empty() => expand_path(d),
        _ => default_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/Music"), home.join("Music"));
        assert_eq!(expand_path("  /tmp/a.mp3 "), PathBuf::from("/tmp/a.mp3"));
    }

    #[test]
    fn test_resolve_dir_defaults_to_desktop() {
        assert_eq!(resolve_dir(None), default_dir());
        assert_eq!(resolve_dir(Some("   ")), default_dir());
        assert_eq!(resolve_dir(Some("/tmp")), PathBuf::from("/tmp"));
    }
}
