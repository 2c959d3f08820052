//! Anti-redownload policy.
//!
//! macOS will happily re-materialize a freshly evicted file. Writing the
//! full set of never-download / evicted / placeholder markers right after
//! every attempt, and again once eviction is confirmed, makes that less
//! likely. Every write is idempotent.

use std::path::Path;
use std::sync::Arc;

use crate::attrs::AttributeStore;
use crate::keys;
use crate::process::CommandRunner;
use crate::strategy::BrctlStrategy;
use crate::types::PolicyOutcome;

/// Writes anti-redownload markers for a file.
#[derive(Clone)]
pub struct Policy {
    store: Arc<dyn AttributeStore>,
    runner: Arc<dyn CommandRunner>,
}

impl Policy {
    /// Create a policy writer.
    pub fn new(store: Arc<dyn AttributeStore>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { store, runner }
    }

    /// Every (attribute, value) pair written, in order.
    pub fn writes() -> impl Iterator<Item = &'static (&'static str, &'static [u8])> {
        keys::EVICTION_MARKERS
            .iter()
            .chain(keys::NOT_MATERIALIZED)
            .chain(keys::AS_PLACEHOLDER)
    }

    /// Apply the policy to `path`.
    ///
    /// A missing path is a no-op. Refused writes are counted, not raised.
    pub fn apply(&self, path: &Path) -> PolicyOutcome {
        let mut outcome = PolicyOutcome::default();
        if !path.exists() {
            return outcome;
        }

        for (name, value) in Self::writes() {
            outcome.attempted += 1;
            if self.store.set(path, name, value).is_ok() {
                outcome.written += 1;
            }
        }

        outcome.brctl_policy = BrctlStrategy::new(self.runner.clone()).pin_policy(path);

        log::info!(
            "set {}/{} eviction policies on {}{}",
            outcome.written,
            outcome.attempted,
            path.display(),
            if outcome.brctl_policy {
                " (brctl policy 'never')"
            } else {
                ""
            }
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::MemoryStore;
    use crate::process::ScriptedRunner;

    fn file() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        std::fs::write(&path, b"x").unwrap();
        (dir, path)
    }

    #[test]
    fn test_applies_all_fourteen_writes() {
        let (_dir, path) = file();
        let store = Arc::new(MemoryStore::new());
        let runner = Arc::new(ScriptedRunner::new());
        let policy = Policy::new(store.clone(), runner.clone());

        let outcome = policy.apply(&path);
        assert_eq!(outcome.attempted, 14);
        assert_eq!(outcome.written, 14);
        assert!(outcome.brctl_policy);
        assert!(outcome.is_applied());

        assert_eq!(
            store.value(&path, "com.apple.file-provider.evicted"),
            Some(b"true".to_vec())
        );
        assert_eq!(
            store.value(&path, "com.apple.clouddocs.auto-download"),
            Some(b"false".to_vec())
        );
        assert_eq!(runner.calls_to("brctl").len(), 1);
    }

    #[test]
    fn test_idempotent() {
        let (_dir, path) = file();
        let store = Arc::new(MemoryStore::new());
        let policy = Policy::new(store.clone(), Arc::new(ScriptedRunner::new()));

        policy.apply(&path);
        let first = crate::attrs::dump(store.as_ref(), &path).unwrap();
        policy.apply(&path);
        let second = crate::attrs::dump(store.as_ref(), &path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_refused_writes_and_missing_brctl() {
        let (_dir, path) = file();
        let policy = Policy::new(
            Arc::new(MemoryStore::new().read_only()),
            Arc::new(ScriptedRunner::new().missing("brctl")),
        );
        let outcome = policy.apply(&path);
        assert_eq!(outcome.written, 0);
        assert_eq!(outcome.attempted, 14);
        assert!(!outcome.brctl_policy);
        assert!(!outcome.is_applied());
    }

    #[test]
    fn test_missing_path_is_noop() {
        let runner = Arc::new(ScriptedRunner::new());
        let policy = Policy::new(Arc::new(MemoryStore::new()), runner.clone());
        let outcome = policy.apply(Path::new("/no/such/file.mp3"));
        assert_eq!(outcome, PolicyOutcome::default());
        assert!(runner.calls().is_empty());
    }
}
