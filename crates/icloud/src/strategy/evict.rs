//! Last resort: a standalone `evict` command, if one is installed.

use std::path::Path;
use std::sync::Arc;

use super::Strategy;
use crate::process::{CommandRunner, path_arg};

/// Strategy that runs `evict <path>`.
pub struct EvictCommandStrategy {
    runner: Arc<dyn CommandRunner>,
}

impl EvictCommandStrategy {
    /// Create the strategy.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Strategy for EvictCommandStrategy {
    fn name(&self) -> &'static str {
        "evict"
    }

    fn attempt(&self, path: &Path) -> bool {
        if !path.exists() {
            log::warn!("file not found: {}", path.display());
            return false;
        }
        if !self.runner.exists("evict") {
            log::warn!("'evict' command not found on this system");
            return false;
        }
        let Ok(path_str) = path_arg(path) else {
            return false;
        };

        match self.runner.run_checked("evict", &[path_str]) {
            Ok(_) => {
                log::info!("removed download using evict: {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("evict failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;

    #[test]
    fn test_checks_for_tool_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ogg");
        std::fs::write(&path, b"x").unwrap();

        let runner = Arc::new(ScriptedRunner::new().missing("evict"));
        assert!(!EvictCommandStrategy::new(runner.clone()).attempt(&path));
        assert!(runner.calls_to("evict").is_empty());

        let runner = Arc::new(ScriptedRunner::new());
        assert!(EvictCommandStrategy::new(runner.clone()).attempt(&path));
        assert_eq!(runner.calls_to("evict").len(), 1);

        let runner = Arc::new(ScriptedRunner::new().failing("evict", "busy"));
        assert!(!EvictCommandStrategy::new(runner).attempt(&path));
    }
}
