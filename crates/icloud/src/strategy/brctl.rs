//! Eviction through Apple's `brctl` CLI.
//!
//! `brctl evict` only removes the LOCAL copy of a file. The file remains
//! safely stored in iCloud and can be re-downloaded at any time.
//! This is NOT a delete operation.
//!
//! The download policy is pinned to `never` both before and after the
//! evict call, otherwise the daemon tends to fetch the file straight back.

use std::path::Path;
use std::sync::Arc;

use super::Strategy;
use crate::error::{Error, Result};
use crate::process::{CommandRunner, path_arg};

/// Strategy that shells out to `brctl`.
pub struct BrctlStrategy {
    runner: Arc<dyn CommandRunner>,
}

impl BrctlStrategy {
    /// Create the strategy.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run a brctl command on `path` and return the output.
    fn run_brctl(&self, path: &Path, args: &[&str]) -> Result<String> {
        self.runner
            .run_checked("brctl", args)
            .map_err(|e| match e {
                Error::ToolFailed { stderr, .. } => parse_brctl_error(&stderr, path),
                other => other,
            })
    }

    /// Ask brctl never to download `path` again.
    pub fn pin_policy(&self, path: &Path) -> bool {
        let set = path_arg(path)
            .and_then(|p| self.run_brctl(path, &["download", p, "--policy", "never"]));
        match set {
            Ok(_) => true,
            Err(e) => {
                log::debug!("brctl download policy not set for {}: {e}", path.display());
                false
            }
        }
    }

    fn evict(&self, path: &Path) -> Result<()> {
        let path_str = path_arg(path)?;

        if self.pin_policy(path) {
            log::info!("set download policy to 'never' for {}", path.display());
        }

        self.run_brctl(path, &["evict", path_str])?;

        if self.pin_policy(path) {
            log::info!("reinforced download policy after eviction");
        }

        Ok(())
    }
}

impl Strategy for BrctlStrategy {
    fn name(&self) -> &'static str {
        "brctl"
    }

    fn attempt(&self, path: &Path) -> bool {
        if !path.exists() {
            log::warn!("file not found: {}", path.display());
            return false;
        }

        match self.evict(path) {
            Ok(()) => true,
            Err(e) if e.is_tool_missing() => {
                log::debug!("brctl not available: {e}");
                false
            }
            Err(e) => {
                log::warn!("brctl evict failed: {e}");
                false
            }
        }
    }
}

/// Parse brctl error messages into specific error types.
fn parse_brctl_error(stderr: &str, path: &Path) -> Error {
    if stderr.contains("cannot be evicted") {
        // Still uploading or otherwise not ready
        Error::ToolFailed {
            tool: "brctl".to_string(),
            stderr: format!("file not ready for eviction: {}", stderr.trim()),
        }
    } else if stderr.contains("No such file") || stderr.contains("does not exist") {
        Error::NotFound(path.to_path_buf())
    } else if stderr.contains("Permission denied") {
        Error::PermissionDenied(path.to_path_buf())
    } else {
        Error::ToolFailed {
            tool: "brctl".to_string(),
            stderr: stderr.trim().to_string(),
        }
    }
}
