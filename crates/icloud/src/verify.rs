//! Post-eviction verification.
//!
//! Providers evict asynchronously and expose no synchronous confirmation,
//! so the verifier waits for the settle delay, re-classifies, and accepts
//! any one of several signals. It prefers a false "confirmed" over a false
//! "unconfirmed".

use std::path::Path;
use std::sync::Arc;

use crate::classify::Classifier;
use crate::clock::Clock;
use crate::keys;
use crate::sidecar;
use crate::types::{FileStatus, Signal, Verification};

/// Decides whether an eviction took effect.
#[derive(Clone)]
pub struct Verifier {
    classifier: Classifier,
    clock: Arc<dyn Clock>,
}

impl Verifier {
    /// Create a verifier using the classifier's settings.
    pub fn new(classifier: Classifier, clock: Arc<dyn Clock>) -> Self {
        Self { classifier, clock }
    }

    /// Wait, re-classify `path` and judge it against `original_size`.
    pub fn verify(&self, path: &Path, original_size: u64) -> Verification {
        self.clock.sleep(self.classifier.settings().settle_delay);

        if !path.exists() {
            if sidecar::is_evicted_by_sidecar(path) {
                return Verification {
                    confirmed: true,
                    signals: vec![Signal::Sidecar],
                    reason: "file replaced by its .icloud placeholder".to_string(),
                };
            }
            return Verification::unconfirmed(format!(
                "file disappeared without a placeholder: {}",
                path.display()
            ));
        }

        match self.classifier.classify(path) {
            Ok(status) => self.judge(&status, original_size),
            Err(e) => Verification::unconfirmed(format!("could not get file status: {e}")),
        }
    }

    /// Judge an already-taken status. No waiting, no I/O beyond reading
    /// policy attribute values for the report.
    pub fn judge(&self, status: &FileStatus, original_size: u64) -> Verification {
        let current = status.size;
        let ratio = self.classifier.settings().shrink_ratio;
        let mut signals = Vec::new();
        let mut reasons = Vec::new();

        if original_size > 0 && (current as f64) < original_size as f64 * ratio {
            signals.push(Signal::SizeShrunk);
            reasons.push(format!(
                "size reduced from {original_size} to {current} bytes"
            ));
        }
        if status.is_placeholder {
            signals.push(Signal::Placeholder);
            reasons.push(format!("file is now a placeholder ({current} bytes)"));
        }
        if !status.is_downloaded {
            signals.push(Signal::NotDownloaded);
            reasons.push("file is no longer marked as downloaded".to_string());
        }
        if !status.has_any_attribute(keys::MATERIALIZED) {
            signals.push(Signal::MaterializedRemoved);
            reasons.push("materialized attributes removed".to_string());
        }

        if signals.is_empty()
            && original_size > 0
            && current == original_size
            && status.has_any_attribute(keys::POLICY)
        {
            let values = self.policy_values(status);
            log::info!(
                "{}: accepting policy-based confirmation, content unchanged",
                status.path.display()
            );
            return Verification {
                confirmed: true,
                signals: vec![Signal::PolicyApplied],
                reason: format!("anti-redownload policies detected: {}", values.join(", ")),
            };
        }

        if signals.is_empty() {
            return Verification::unconfirmed(format!(
                "file still appears to be downloaded (size: {current} bytes)"
            ));
        }

        Verification {
            confirmed: true,
            signals,
            reason: reasons.join("; "),
        }
    }

    fn policy_values(&self, status: &FileStatus) -> Vec<String> {
        keys::POLICY
            .iter()
            .filter(|name| status.has_attribute(name))
            .map(|name| {
                match self.classifier.store().get(&status.path, name) {
                    Ok(v) => format!("{}={}", name, String::from_utf8_lossy(&v)),
                    Err(_) => (*name).to_string(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::{AttributeStore, MemoryStore};
    use crate::clock::ManualClock;
    use crate::process::ScriptedRunner;
    use crate::settings::Settings;
    use crate::strategy::{AttributeStrategy, BrctlStrategy, Strategy};
    use std::path::PathBuf;
    use std::time::Duration;

    const MATERIALIZED: &str = "com.apple.file-provider.materialized";

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new(store: MemoryStore) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().join("CloudDocs");
            std::fs::create_dir_all(&root).unwrap();
            Self {
                _dir: dir,
                root,
                store: Arc::new(store),
                clock: Arc::new(ManualClock::new()),
            }
        }

        fn verifier(&self) -> Verifier {
            let classifier =
                Classifier::new(self.store.clone(), self.root.clone(), Settings::default());
            Verifier::new(classifier, self.clock.clone())
        }
    }

    fn status(size: u64, downloaded: bool, attributes: &[&str]) -> FileStatus {
        FileStatus {
            path: PathBuf::from("/cloud/x"),
            is_cloud_file: true,
            is_downloaded: downloaded,
            is_downloading: false,
            is_placeholder: !downloaded,
            size,
            attributes: attributes.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_judge_unconfirmed_when_nothing_changed() {
        let fx = Fixture::new(MemoryStore::new());
        let v = fx
            .verifier()
            .judge(&status(5_000, true, &[MATERIALIZED]), 5_000);
        assert!(!v.confirmed);
        assert!(v.reason.contains("still appears to be downloaded"));
    }

    #[test]
    fn test_judge_materialized_removed() {
        let fx = Fixture::new(MemoryStore::new());
        let v = fx.verifier().judge(&status(5_000, true, &[]), 5_000);
        assert!(v.confirmed);
        assert_eq!(v.signals, vec![Signal::MaterializedRemoved]);
    }

    #[test]
    fn test_judge_policy_is_weak_confirmation() {
        let fx = Fixture::new(MemoryStore::new());
        let s = status(
            5_000,
            true,
            &[MATERIALIZED, "com.apple.file-provider.evicted"],
        );
        let v = fx.verifier().judge(&s, 5_000);
        assert!(v.confirmed);
        assert_eq!(v.signals, vec![Signal::PolicyApplied]);
        assert!(v.reason.contains("com.apple.file-provider.evicted"));

        // Policy alone does not count once the size has moved.
        let v = fx.verifier().judge(&s, 6_000);
        assert!(!v.confirmed);
    }

    #[test]
    fn test_judge_placeholder() {
        let fx = Fixture::new(MemoryStore::new());
        let v = fx
            .verifier()
            .judge(&status(5_000, false, &[MATERIALIZED]), 5_000);
        assert!(v.confirmed);
        assert!(v.has_signal(Signal::Placeholder));
        assert!(v.has_signal(Signal::NotDownloaded));
        assert!(!v.has_signal(Signal::SizeShrunk));
    }

    #[test]
    fn test_verify_waits_settle_delay() {
        let fx = Fixture::new(MemoryStore::new());
        let path = fx.root.join("a.txt");
        std::fs::write(&path, b"x").unwrap();

        fx.verifier().verify(&path, 1);
        assert_eq!(fx.clock.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn test_verify_sidecar_when_file_vanished() {
        let fx = Fixture::new(MemoryStore::new());
        let path = fx.root.join("song.mp3");
        std::fs::write(fx.root.join(".song.mp3.icloud"), b"stub").unwrap();

        let v = fx.verifier().verify(&path, 4_000_000);
        assert!(v.confirmed);
        assert_eq!(v.signals, vec![Signal::Sidecar]);

        let gone = fx.verifier().verify(&fx.root.join("other.mp3"), 10);
        assert!(!gone.confirmed);
    }

    #[test]
    fn test_shrunk_file_after_attribute_strategy() {
        let fx = Fixture::new(MemoryStore::new());
        let path = fx.root.join("track.m4a");
        std::fs::write(&path, vec![7u8; 200_000]).unwrap();
        fx.store.set(&path, MATERIALIZED, b"1").unwrap();

        let runner = Arc::new(ScriptedRunner::new().missing("brctl"));
        assert!(!BrctlStrategy::new(runner).attempt(&path));
        assert!(AttributeStrategy::new(fx.store.clone()).attempt(&path));

        // Provider drops the payload.
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(500)
            .unwrap();

        let v = fx.verifier().verify(&path, 200_000);
        assert!(v.confirmed);
        assert_eq!(v.signals[0], Signal::SizeShrunk);
        assert!(v.reason.contains("size reduced from 200000 to 500 bytes"));
    }
}
