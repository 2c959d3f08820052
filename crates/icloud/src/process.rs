//! External tool invocation.
//!
//! Every tool this crate talks to (`brctl`, `osascript`, `xattr`, `evict`)
//! goes through [`CommandRunner`] so tests can script outcomes instead of
//! touching the real system.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub code: Option<i32>,
    /// Standard output (lossy UTF-8)
    pub stdout: String,
    /// Standard error (lossy UTF-8)
    pub stderr: String,
}

/// Runs external programs.
///
/// `run` only fails when the program could not be started. A non-zero exit
/// is an `Ok` with `success == false`.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its output.
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput>;

    /// Run and turn a non-zero exit into [`Error::ToolFailed`].
    fn run_checked(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = self.run(program, args)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(Error::ToolFailed {
                tool: program.to_string(),
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Check if a program is on PATH.
    fn exists(&self, program: &str) -> bool {
        self.run("which", &[program])
            .map(|o| o.success)
            .unwrap_or(false)
    }
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        log::trace!("exec: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ToolNotFound(program.to_string())
                } else {
                    Error::Io(e)
                }
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Runner with canned outcomes that records every invocation.
///
/// Programs succeed with empty output unless marked missing or failing.
/// `which <program>` answers according to the missing set.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    missing: HashSet<String>,
    failing: HashMap<String, String>,
    stdout: HashMap<String, String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    /// Create a runner where every program succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` fail to launch.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    /// Make `program` exit non-zero with `stderr`.
    pub fn failing(mut self, program: &str, stderr: &str) -> Self {
        self.failing
            .insert(program.to_string(), stderr.to_string());
        self
    }

    /// Make `program` print `stdout` on success.
    pub fn printing(mut self, program: &str, stdout: &str) -> Self {
        self.stdout.insert(program.to_string(), stdout.to_string());
        self
    }

    /// Every invocation so far, program first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Invocations of `program`, excluding `which` lookups.
    pub fn calls_to(&self, program: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|call| call.first().is_some_and(|p| p == program))
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        let mut call = vec![program.to_string()];
        call.extend(args.iter().map(ToString::to_string));
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);

        if program == "which" {
            let found = args.first().is_some_and(|p| !self.missing.contains(*p));
            return Ok(ToolOutput {
                success: found,
                code: Some(i32::from(!found)),
                ..ToolOutput::default()
            });
        }

        if self.missing.contains(program) {
            return Err(Error::ToolNotFound(program.to_string()));
        }

        if let Some(stderr) = self.failing.get(program) {
            return Ok(ToolOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            });
        }

        Ok(ToolOutput {
            success: true,
            code: Some(0),
            stdout: self.stdout.get(program).cloned().unwrap_or_default(),
            stderr: String::new(),
        })
    }
}

/// Convert a path to a tool argument, rejecting non-UTF-8 paths.
pub fn path_arg(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        Error::InvalidPath(format!("path contains invalid UTF-8: {}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_checked_maps_nonzero_exit() {
        let runner = ScriptedRunner::new().failing("brctl", "  cannot be evicted\n");
        let err = runner.run_checked("brctl", &["evict", "/x"]).unwrap_err();
        match err {
            Error::ToolFailed { tool, stderr } => {
                assert_eq!(tool, "brctl");
                assert_eq!(stderr, "cannot be evicted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scripted_runner_records_calls() {
        let runner = ScriptedRunner::new().printing("xattr", "com.apple.quarantine\n");
        let out = runner.run_checked("xattr", &["/tmp/a"]).unwrap();
        assert_eq!(out, "com.apple.quarantine\n");
        assert_eq!(runner.calls(), vec![vec!["xattr", "/tmp/a"]]);
    }

    #[test]
    fn test_exists_follows_missing_set() {
        let runner = ScriptedRunner::new().missing("evict");
        assert!(!runner.exists("evict"));
        assert!(runner.exists("brctl"));
        assert!(runner.run("evict", &["/x"]).unwrap_err().is_tool_missing());
        assert_eq!(runner.calls_to("which").len(), 2);
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run("definitely-not-a-real-tool-4242", &[])
            .unwrap_err();
        assert!(err.is_tool_missing());
    }

    #[test]
    fn test_path_arg() {
        assert_eq!(path_arg(Path::new("/tmp/a b")).unwrap(), "/tmp/a b");
    }
}
