//! Eviction scripted through Finder.
//!
//! Touches the file and asks Finder to refresh it, then runs `brctl evict`
//! with administrator privileges from inside the script. If that fails the
//! script falls back to `cloudctl evict`. The script prints `true` or
//! `false` so a handled failure is distinguishable from success.

use std::path::Path;
use std::sync::Arc;

use super::Strategy;
use crate::process::{CommandRunner, path_arg};

/// Strategy that runs an AppleScript via `osascript`.
pub struct FinderStrategy {
    runner: Arc<dyn CommandRunner>,
}

impl FinderStrategy {
    /// Create the strategy.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Strategy for FinderStrategy {
    fn name(&self) -> &'static str {
        "finder"
    }

    fn attempt(&self, path: &Path) -> bool {
        if !path.exists() {
            log::warn!("file not found: {}", path.display());
            return false;
        }
        let Ok(path_str) = path_arg(path) else {
            log::warn!("skipping Finder script for non-UTF-8 path {}", path.display());
            return false;
        };

        let script = build_script(path_str);
        match self.runner.run("osascript", &["-e", script.as_str()]) {
            Ok(out) if out.success && out.stdout.trim() != "false" => {
                log::info!("evicted via Finder script: {}", path.display());
                true
            }
            Ok(out) => {
                log::warn!("Finder script failed: {}", out.stderr.trim());
                false
            }
            Err(e) if e.is_tool_missing() => {
                log::debug!("osascript not available: {e}");
                false
            }
            Err(e) => {
                log::warn!("Finder script could not run: {e}");
                false
            }
        }
    }
}

/// Quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Escape `s` for use inside an AppleScript string literal.
fn applescript_escape(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', "\\\"")
}

fn build_script(path: &str) -> String {
    let posix = applescript_escape(path);
    let quoted = applescript_escape(&shell_quote(path));
    format!(
        r#"tell application "Finder"
    set theFile to POSIX file "{posix}" as alias
    try
        do shell script "touch {quoted}"
        delay 0.1
        update theFile
        do shell script "brctl evict {quoted}" with administrator privileges
        return true
    on error
        try
            do shell script "cloudctl evict {quoted}"
            return true
        on error
            return false
        end try
    end try
end tell"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/a b/c"), "'/a b/c'");
        assert_eq!(shell_quote("/it's"), r"'/it'\''s'");
    }

    #[test]
    fn test_script_escapes_quotes() {
        let script = build_script(r#"/tmp/say "hi".txt"#);
        assert!(script.contains(r#"POSIX file "/tmp/say \"hi\".txt""#));
        assert!(script.contains("with administrator privileges"));
        assert!(script.contains("cloudctl evict"));
    }

    #[test]
    fn test_attempt_reads_script_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        std::fs::write(&path, b"x").unwrap();

        let ok = Arc::new(ScriptedRunner::new().printing("osascript", "true\n"));
        assert!(FinderStrategy::new(ok.clone()).attempt(&path));
        assert_eq!(ok.calls_to("osascript")[0][1], "-e");

        let handled = Arc::new(ScriptedRunner::new().printing("osascript", "false\n"));
        assert!(!FinderStrategy::new(handled).attempt(&path));

        let missing = Arc::new(ScriptedRunner::new().missing("osascript"));
        assert!(!FinderStrategy::new(missing).attempt(&path));
    }
}
