//! # icloud
//!
//! Classify iCloud Drive files on macOS and evict their local copies,
//! verifying that each eviction actually happened.
//!
//! ## Safety Guarantees
//!
//! **This crate NEVER deletes files from iCloud.** Eviction removes only the
//! local copy; the file stays in iCloud and re-downloads when opened. Files
//! that do not classify as iCloud files are never handed to a strategy and
//! never have attributes written.
//!
//! ## How eviction works
//!
//! macOS offers no single reliable eviction call, so [`Client::evict`] tries
//! several [`Strategy`] implementations in order (`brctl`, Finder via
//! AppleScript, extended attributes, a third-party `evict` tool). After each
//! one it writes an anti-redownload policy and asks the [`Verifier`] whether
//! the local copy is gone. A strategy reporting success proves nothing; only
//! verification does.
//!
//! ## Example
//!
//! ```no_run
//! use icloud::Client;
//!
//! let client = Client::new().expect("iCloud Drive not available");
//!
//! let report = client
//!     .evict("~/Library/Mobile Documents/com~apple~CloudDocs/movie.mov")
//!     .expect("could not inspect file");
//!
//! if report.success {
//!     println!("evicted via {:?}", report.strategy);
//! }
//! ```
//!
//! ## Platform Support
//!
//! macOS only. The external tools (`brctl`, `osascript`, `xattr`) are looked
//! up at run time; a missing tool makes its strategy fail, nothing more.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Extended attribute access.
pub mod attrs;
/// Download-state classification.
pub mod classify;
/// Injectable sleeping.
pub mod clock;
/// Error types for iCloud operations.
pub mod error;
/// Provider attribute names and values.
pub mod keys;
/// Anti-redownload policy writes.
pub mod policy;
/// External command execution.
pub mod process;
/// Tunable thresholds and delays.
pub mod settings;
/// `.name.icloud` sidecar helpers.
pub mod sidecar;
/// Eviction strategies.
pub mod strategy;
/// Common types for file status and eviction results.
pub mod types;
/// Post-eviction verification.
pub mod verify;

mod scan;

pub use attrs::{AttributeEntry, AttributeStore, MemoryStore, XattrCli};
pub use classify::Classifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use policy::Policy;
pub use process::{CommandRunner, ScriptedRunner, SystemRunner, ToolOutput};
pub use settings::{Settings, ValuePolicy};
pub use strategy::Strategy;
pub use types::{
    BatchReport, EvictionOutcome, EvictionReport, FileStatus, PolicyOutcome, ScanReport, Signal,
    StrategyAttempt, Verification,
};
pub use verify::Verifier;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// iCloud Drive location relative to the home directory.
pub const CLOUD_DOCS: &str = "Library/Mobile Documents/com~apple~CloudDocs";

/// The iCloud Drive root for the current user.
pub fn default_cloud_root() -> Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .ok_or_else(|| Error::ICloudNotAvailable("HOME is not set".to_string()))?;
    Ok(PathBuf::from(home).join(CLOUD_DOCS))
}

/// High-level client for classification and eviction.
///
/// Holds no per-file state; every call re-reads the filesystem.
pub struct Client {
    classifier: Classifier,
    verifier: Verifier,
    policy: Policy,
    strategies: Vec<Box<dyn Strategy>>,
    clock: Arc<dyn Clock>,
    runner: Arc<dyn CommandRunner>,
}

impl Client {
    /// Create a client for the current user's iCloud Drive, using the real
    /// tools and clock.
    ///
    /// Fails only if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start building a client with custom collaborators.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The iCloud Drive root.
    pub fn cloud_root(&self) -> &Path {
        self.classifier.cloud_root()
    }

    /// Active settings.
    pub fn settings(&self) -> &Settings {
        self.classifier.settings()
    }

    /// The command runner shared by the strategies.
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Names of the configured strategies, in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Check if a path is within iCloud Drive.
    pub fn is_in_icloud(&self, path: impl AsRef<Path>) -> bool {
        expand_and_validate_path(path.as_ref())
            .is_ok_and(|path| self.classifier.is_in_cloud_root(&path))
    }

    /// Classify a file. Read-only.
    pub fn status(&self, path: impl AsRef<Path>) -> Result<FileStatus> {
        self.classifier.classify(path.as_ref())
    }

    /// List every extended attribute on `path` with its value.
    pub fn attributes(&self, path: impl AsRef<Path>) -> Result<Vec<AttributeEntry>> {
        let path = expand_and_validate_path(path.as_ref())?;
        if !path.exists() {
            return Err(Error::NotFound(path));
        }
        attrs::dump(self.classifier.store().as_ref(), &path)
    }

    /// Evict the local copy of one file, keeping the cloud copy.
    ///
    /// Fails only if the file cannot be classified. Every other outcome,
    /// including an unconfirmed eviction, is reported in the returned
    /// [`EvictionReport`].
    ///
    /// Strategies run in order. After each one the policy is written and the
    /// result verified; the first confirmation stops the loop. If none
    /// confirms, one delayed recheck and a final classification follow.
    pub fn evict(&self, path: impl AsRef<Path>) -> Result<EvictionReport> {
        let initial = self.classifier.classify(path.as_ref())?;
        let path = initial.path.clone();

        if !initial.is_cloud_file {
            log::info!("skipping {}: not an iCloud file", path.display());
            return Ok(EvictionReport::skipped(
                &initial,
                EvictionOutcome::NotCloudFile,
                "not an iCloud file",
            ));
        }

        if !initial.is_downloaded {
            log::info!("{} is already evicted", path.display());
            return Ok(EvictionReport::skipped(
                &initial,
                EvictionOutcome::AlreadyEvicted,
                "already evicted",
            ));
        }

        let original_size = initial.size;
        log::info!("evicting {} ({} bytes)", path.display(), original_size);

        let mut attempts: Vec<StrategyAttempt> = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let name = strategy.name();
            log::info!("trying {name} method");

            let executed = strategy.attempt(&path);
            if executed {
                log::debug!("{name} reported success");
            } else {
                log::debug!("{name} reported failure");
            }

            self.policy.apply(&path);
            let verification = self.verifier.verify(&path, original_size);
            log::info!("{name}: {}", verification.reason);

            let confirmed = verification.confirmed;
            let message = verification.reason.clone();
            attempts.push(StrategyAttempt {
                strategy: name.to_string(),
                executed,
                verification,
            });

            if confirmed {
                self.policy.apply(&path);
                return Ok(EvictionReport {
                    path,
                    strategy: Some(name.to_string()),
                    success: true,
                    message,
                    outcome: EvictionOutcome::Confirmed,
                    original_size,
                    attempts,
                    final_status: None,
                });
            }
        }

        let last_strategy = attempts.last().map(|a| a.strategy.clone());

        log::info!(
            "no strategy confirmed eviction of {}; rechecking in {:?}",
            path.display(),
            self.settings().recheck_delay
        );
        self.clock.sleep(self.settings().recheck_delay);
        let delayed = self.verifier.verify(&path, original_size);
        if delayed.confirmed {
            self.policy.apply(&path);
            return Ok(EvictionReport {
                path,
                strategy: last_strategy,
                success: true,
                message: format!("confirmed after delay: {}", delayed.reason),
                outcome: EvictionOutcome::ConfirmedAfterDelay,
                original_size,
                attempts,
                final_status: None,
            });
        }

        let final_status = match self.classifier.classify(&path) {
            Ok(status) => Some(status),
            Err(e) => {
                log::debug!("final check of {} failed: {}", path.display(), e);
                None
            }
        };

        if let Some(status) = &final_status
            && (!status.is_downloaded || status.is_placeholder)
        {
            self.policy.apply(&path);
            return Ok(EvictionReport {
                path,
                strategy: last_strategy,
                success: true,
                message: "file shows as not downloaded".to_string(),
                outcome: EvictionOutcome::ConfirmedByFinalCheck,
                original_size,
                attempts,
                final_status,
            });
        }

        self.policy.apply(&path);
        log::warn!("could not confirm eviction of {}", path.display());
        Ok(EvictionReport {
            path,
            strategy: last_strategy,
            success: false,
            message: format!("could not confirm eviction: {}", delayed.reason),
            outcome: EvictionOutcome::Unconfirmed,
            original_size,
            attempts,
            final_status,
        })
    }

    /// Evict many files one at a time, in the given order.
    ///
    /// Per-file failures are recorded and never stop the batch.
    /// `on_progress` is called after each file with its index and the
    /// running totals.
    pub fn evict_all(
        &self,
        paths: &[impl AsRef<Path>],
        mut on_progress: impl FnMut(usize, &BatchReport),
    ) -> BatchReport {
        let mut batch = BatchReport::default();
        for (index, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            match self.evict(path) {
                Ok(report) => batch.add_report(report),
                Err(e) => {
                    if e.is_expected_failure() {
                        log::warn!("failed to evict {}: {}", path.display(), e);
                    } else {
                        log::error!("failed to evict {}: {}", path.display(), e);
                    }
                    batch.add_failure(path.to_path_buf(), e.to_string());
                }
            }
            on_progress(index, &batch);
        }
        batch
    }

    /// Find downloaded iCloud files under `root`.
    ///
    /// `extensions` restricts the walk to those extensions (case-insensitive,
    /// leading dot optional); an empty slice matches every file.
    pub fn find_downloaded(
        &self,
        root: impl AsRef<Path>,
        extensions: &[&str],
    ) -> Result<ScanReport> {
        self.find_downloaded_with_progress(root, extensions, |_| {})
    }

    /// Like [`find_downloaded`](Self::find_downloaded), calling `progress`
    /// with the running count of files checked.
    pub fn find_downloaded_with_progress(
        &self,
        root: impl AsRef<Path>,
        extensions: &[&str],
        progress: impl FnMut(usize),
    ) -> Result<ScanReport> {
        let root = expand_and_validate_path(root.as_ref())?;
        scan::find_downloaded(&self.classifier, &root, extensions, progress)
    }

    /// Write the anti-redownload policy to a file, or to every iCloud file
    /// under a directory.
    ///
    /// Only files that classify as iCloud files are touched. Returns how
    /// many files had at least one attribute written.
    pub fn protect(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = expand_and_validate_path(path.as_ref())?;

        let candidates = if path.is_dir() {
            let mut errors = Vec::new();
            let entries = scan::walk(&path, &mut errors)?;
            for (p, e) in &errors {
                log::warn!("skipping {}: {}", p.display(), e);
            }
            entries
                .into_iter()
                .filter_map(|entry| match entry {
                    scan::Entry::File(p) => Some(p),
                    scan::Entry::Sidecar(_) => None,
                })
                .collect()
        } else if path.exists() {
            vec![path]
        } else {
            return Err(Error::NotFound(path));
        };

        let mut protected = 0;
        for candidate in candidates {
            match self.classifier.classify(&candidate) {
                Ok(status) if status.is_cloud_file => {
                    if self.policy.apply(&candidate).is_applied() {
                        protected += 1;
                    }
                }
                Ok(_) => log::debug!("not protecting {}: not an iCloud file", candidate.display()),
                Err(e) => log::warn!("skipping {}: {}", candidate.display(), e),
            }
        }
        Ok(protected)
    }
}

/// Builder for [`Client`].
///
/// Anything left unset falls back to the production implementation.
#[derive(Default)]
pub struct ClientBuilder {
    cloud_root: Option<PathBuf>,
    store: Option<Arc<dyn AttributeStore>>,
    runner: Option<Arc<dyn CommandRunner>>,
    clock: Option<Arc<dyn Clock>>,
    settings: Settings,
    strategies: Option<Vec<Box<dyn Strategy>>>,
}

impl ClientBuilder {
    /// Use `root` as the iCloud Drive root.
    pub fn cloud_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cloud_root = Some(root.into());
        self
    }

    /// Use `store` for attribute reads and writes.
    pub fn attributes(mut self, store: Arc<dyn AttributeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `runner` for external commands.
    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Use `clock` for settle and recheck delays.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the settings.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the strategy list.
    pub fn strategies(mut self, strategies: Vec<Box<dyn Strategy>>) -> Self {
        self.strategies = Some(strategies);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let cloud_root = match self.cloud_root {
            Some(root) => expand_and_validate_path(&root)?,
            None => default_cloud_root()?,
        };
        let runner = self
            .runner
            .unwrap_or_else(|| Arc::new(SystemRunner) as Arc<dyn CommandRunner>);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(XattrCli::with_runner(runner.clone())) as Arc<dyn AttributeStore>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let strategies = self
            .strategies
            .unwrap_or_else(|| strategy::default_strategies(store.clone(), runner.clone()));

        log::debug!("iCloud Drive root: {}", cloud_root.display());

        let classifier = Classifier::new(store.clone(), cloud_root, self.settings);
        Ok(Client {
            verifier: Verifier::new(classifier.clone(), clock.clone()),
            policy: Policy::new(store, runner.clone()),
            classifier,
            strategies,
            clock,
            runner,
        })
    }
}

/// Expand ~ in paths and return the expanded path.
pub(crate) fn expand_path(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if let Some(rest) = path_str.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    path.to_path_buf()
}

/// Resolve `.` and `..` without touching the filesystem. `..` never
/// climbs above the root.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !path.is_absolute() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Expand path, make it absolute and resolve `..`.
pub(crate) fn expand_and_validate_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidPath("empty path".to_string()));
    }

    let expanded = expand_path(path);

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map_err(Error::Io)?
            .join(&expanded)
    };

    Ok(normalize_path(&absolute))
}
