use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the classifier concluded about one file at one moment.
///
/// Recomputed on every inspection and never cached. For a cloud file
/// exactly one of `is_downloaded` and `is_placeholder` is set; for any
/// other file every flag is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    /// Absolute path that was inspected
    pub path: PathBuf,
    /// Carries a provider attribute or lives under the iCloud Drive root
    pub is_cloud_file: bool,
    /// Local content is believed to be the real payload
    pub is_downloaded: bool,
    /// A transfer attribute is present
    pub is_downloading: bool,
    /// Local entry is believed to be a stub
    pub is_placeholder: bool,
    /// Size reported by filesystem metadata (may exceed resident bytes)
    pub size: u64,
    /// Raw extended attribute names
    pub attributes: Vec<String>,
}

impl FileStatus {
    /// Status for a file that is not managed by iCloud.
    pub fn local(path: PathBuf, size: u64, attributes: Vec<String>) -> Self {
        Self {
            path,
            is_cloud_file: false,
            is_downloaded: false,
            is_downloading: false,
            is_placeholder: false,
            size,
            attributes,
        }
    }

    /// Returns true if this file can be evicted right now.
    pub fn is_evictable(&self) -> bool {
        self.is_cloud_file && self.is_downloaded
    }

    /// Returns true if `name` is among the attributes.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// Returns true if any of `names` is among the attributes.
    pub fn has_any_attribute(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.has_attribute(n))
    }
}

/// Evidence that confirmed an eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Re-classified as a placeholder
    Placeholder,
    /// Re-classified as not downloaded
    NotDownloaded,
    /// Size dropped below the shrink ratio of the original
    SizeShrunk,
    /// No materialized attribute remains
    MaterializedRemoved,
    /// Size unchanged but policy attributes are present (weak)
    PolicyApplied,
    /// Original path is gone and a `.name.icloud` sidecar exists
    Sidecar,
}

impl Signal {
    /// Returns true if the signal is about content rather than policy
    /// metadata.
    pub fn is_content_based(self) -> bool {
        !matches!(self, Signal::PolicyApplied)
    }
}

/// Verifier verdict for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether the eviction is considered done
    pub confirmed: bool,
    /// Every signal that fired, strongest first
    pub signals: Vec<Signal>,
    /// Human-readable explanation
    pub reason: String,
}

impl Verification {
    /// An unconfirmed verdict.
    pub fn unconfirmed(reason: impl Into<String>) -> Self {
        Self {
            confirmed: false,
            signals: Vec::new(),
            reason: reason.into(),
        }
    }

    /// Returns true if `signal` contributed to the verdict.
    pub fn has_signal(&self, signal: Signal) -> bool {
        self.signals.contains(&signal)
    }
}

/// Terminal state of a single-file eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionOutcome {
    /// Not an iCloud file; nothing was touched
    NotCloudFile,
    /// Already evicted; nothing was attempted
    AlreadyEvicted,
    /// Verified right after a strategy
    Confirmed,
    /// Verified on the delayed re-check
    ConfirmedAfterDelay,
    /// Accepted by the final status check
    ConfirmedByFinalCheck,
    /// Could not confirm eviction
    Unconfirmed,
}

impl EvictionOutcome {
    /// Returns true for the outcomes that count as success.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::NotCloudFile | Self::Unconfirmed)
    }

    /// Returns true if no strategy was run.
    pub fn is_noop(self) -> bool {
        matches!(self, Self::NotCloudFile | Self::AlreadyEvicted)
    }
}

/// One strategy invocation and its verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    /// Strategy name
    pub strategy: String,
    /// Whether the strategy reported success at the command level
    pub executed: bool,
    /// Verification that followed
    pub verification: Verification,
}

/// Result of evicting one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvictionReport {
    /// Absolute path
    pub path: PathBuf,
    /// Strategy credited with the result (the last one tried on failure)
    pub strategy: Option<String>,
    /// Whether the eviction counts as done
    pub success: bool,
    /// Verification or skip message
    pub message: String,
    /// Terminal state
    pub outcome: EvictionOutcome,
    /// Size before any strategy ran
    pub original_size: u64,
    /// Every strategy tried, in order
    pub attempts: Vec<StrategyAttempt>,
    /// Last classification, when one was taken after the attempts
    pub final_status: Option<FileStatus>,
}

impl EvictionReport {
    pub(crate) fn skipped(status: &FileStatus, outcome: EvictionOutcome, message: &str) -> Self {
        Self {
            path: status.path.clone(),
            strategy: None,
            success: outcome.is_success(),
            message: message.to_string(),
            outcome,
            original_size: status.size,
            attempts: Vec::new(),
            final_status: None,
        }
    }
}

/// Result of evicting many files in sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Files confirmed evicted (including already evicted)
    pub succeeded: usize,
    /// Files that could not be confirmed or could not be inspected
    pub failed: usize,
    /// Files skipped because they are not iCloud files
    pub skipped: usize,
    /// Sum of original sizes of confirmed files
    pub bytes: u64,
    /// Paths that failed with a message
    pub errors: Vec<(PathBuf, String)>,
    /// Per-file reports, in processing order
    pub reports: Vec<EvictionReport>,
}

impl BatchReport {
    /// Record a finished eviction.
    pub fn add_report(&mut self, report: EvictionReport) {
        match report.outcome {
            EvictionOutcome::NotCloudFile => self.skipped += 1,
            EvictionOutcome::AlreadyEvicted => self.succeeded += 1,
            outcome if outcome.is_success() => {
                self.succeeded += 1;
                self.bytes += report.original_size;
            }
            _ => {
                self.failed += 1;
                self.errors
                    .push((report.path.clone(), report.message.clone()));
            }
        }
        self.reports.push(report);
    }

    /// Record a file that could not be processed at all.
    pub fn add_failure(&mut self, path: PathBuf, error: String) {
        self.failed += 1;
        self.errors.push((path, error));
    }

    /// Check if every file succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total files processed
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// Result of walking a directory for eviction candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Regular files inspected (after the extension filter)
    pub files_checked: usize,
    /// Files classified as iCloud files
    pub cloud_files: usize,
    /// Downloaded iCloud files, in listing order
    pub downloaded: Vec<FileStatus>,
    /// Placeholder iCloud files
    pub placeholders: Vec<PathBuf>,
    /// iCloud files with a transfer in flight
    pub in_transfer: Vec<PathBuf>,
    /// `.name.icloud` sidecars, mapped back to the file they stand for
    pub sidecars: Vec<PathBuf>,
    /// Paths that could not be walked or classified
    pub errors: Vec<(PathBuf, String)>,
}

impl ScanReport {
    /// Total bytes held locally by the downloaded files.
    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded.iter().map(|f| f.size).sum()
    }
}

/// Result of an anti-redownload policy write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOutcome {
    /// Attribute writes that landed
    pub written: usize,
    /// Attribute writes attempted
    pub attempted: usize,
    /// Whether `brctl download --policy never` succeeded
    pub brctl_policy: bool,
}

impl PolicyOutcome {
    /// Returns true if at least one attribute write landed.
    pub fn is_applied(&self) -> bool {
        self.written > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(path: &str, size: u64) -> FileStatus {
        FileStatus {
            path: PathBuf::from(path),
            is_cloud_file: true,
            is_downloaded: true,
            is_downloading: false,
            is_placeholder: false,
            size,
            attributes: vec!["com.apple.file-provider.materialized".to_string()],
        }
    }

    fn report(path: &str, outcome: EvictionOutcome, size: u64) -> EvictionReport {
        EvictionReport::skipped(&status(path, size), outcome, "test")
    }

    #[test]
    fn test_local_status_has_no_flags() {
        let s = FileStatus::local(PathBuf::from("/tmp/a"), 10, Vec::new());
        assert!(!s.is_cloud_file && !s.is_downloaded && !s.is_placeholder);
        assert!(!s.is_evictable());
    }

    #[test]
    fn test_attribute_lookup() {
        let s = status("/c/a", 1);
        assert!(s.has_attribute("com.apple.file-provider.materialized"));
        assert!(s.has_any_attribute(&["x", "com.apple.file-provider.materialized"]));
        assert!(!s.has_any_attribute(&["x", "y"]));
    }

    #[test]
    fn test_outcome_classification() {
        assert!(EvictionOutcome::AlreadyEvicted.is_success());
        assert!(EvictionOutcome::AlreadyEvicted.is_noop());
        assert!(EvictionOutcome::ConfirmedByFinalCheck.is_success());
        assert!(!EvictionOutcome::Unconfirmed.is_success());
        assert!(!EvictionOutcome::NotCloudFile.is_success());
        assert!(!EvictionOutcome::Confirmed.is_noop());
    }

    #[test]
    fn test_batch_report_counts() {
        let mut batch = BatchReport::default();
        batch.add_report(report("/c/a", EvictionOutcome::Confirmed, 100));
        batch.add_report(report("/c/b", EvictionOutcome::AlreadyEvicted, 50));
        batch.add_report(report("/c/c", EvictionOutcome::Unconfirmed, 70));
        batch.add_report(report("/c/d", EvictionOutcome::NotCloudFile, 10));
        batch.add_failure(PathBuf::from("/c/e"), "path not found".to_string());

        assert_eq!(batch.succeeded, 2);
        assert_eq!(batch.failed, 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.bytes, 100);
        assert_eq!(batch.total(), 5);
        assert_eq!(batch.reports.len(), 4);
        assert!(!batch.is_success());
    }

    #[test]
    fn test_signal_strength() {
        assert!(Signal::SizeShrunk.is_content_based());
        assert!(!Signal::PolicyApplied.is_content_based());
    }
}
