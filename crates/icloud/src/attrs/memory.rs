use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::AttributeStore;
use crate::error::{Error, Result};

/// In-memory attribute store.
///
/// Keyed by path only; it never looks at the filesystem. Supports
/// read-only mode and per-name read failures to exercise the error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    attrs: Mutex<HashMap<PathBuf, BTreeMap<String, Vec<u8>>>>,
    unreadable: HashSet<String>,
    unlistable: bool,
    read_only: bool,
    writes: Mutex<usize>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an attribute.
    pub fn with(self, path: &Path, name: &str, value: &[u8]) -> Self {
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_path_buf())
            .or_default()
            .insert(name.to_string(), value.to_vec());
        self
    }

    /// Make reads of attribute `name` fail.
    pub fn unreadable(mut self, name: &str) -> Self {
        self.unreadable.insert(name.to_string());
        self
    }

    /// Make every attribute listing fail.
    pub fn unlistable(mut self) -> Self {
        self.unlistable = true;
        self
    }

    /// Reject all writes and removals.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Current value of `name`, bypassing the unreadable set.
    pub fn value(&self, path: &Path, name: &str) -> Option<Vec<u8>> {
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .and_then(|a| a.get(name).cloned())
    }

    /// Number of successful writes and removals.
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self.read_only {
            return Err(Error::PermissionDenied(path.to_path_buf()));
        }
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

impl AttributeStore for MemoryStore {
    fn names(&self, path: &Path) -> Result<Vec<String>> {
        if self.unlistable {
            return Err(Error::PermissionDenied(path.to_path_buf()));
        }
        Ok(self
            .attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map(|a| a.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, path: &Path, name: &str) -> Result<Vec<u8>> {
        if self.unreadable.contains(name) {
            return Err(Error::PermissionDenied(path.to_path_buf()));
        }
        self.value(path, name)
            .ok_or_else(|| Error::Other(format!("no such attribute: {name}")))
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        self.attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_path_buf())
            .or_default()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, path: &Path, name: &str) -> Result<()> {
        let removed = self
            .attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .is_some_and(|a| a.contains_key(name));
        if !removed {
            return Err(Error::Other(format!("no such attribute: {name}")));
        }
        self.check_writable(path)?;
        if let Some(attrs) = self
            .attrs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(path)
        {
            attrs.remove(name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let path = Path::new("/cloud/a.txt");
        let store = MemoryStore::new();

        store.set(path, "com.apple.file-provider.evicted", b"1").unwrap();
        assert_eq!(
            store.get(path, "com.apple.file-provider.evicted").unwrap(),
            b"1"
        );
        assert_eq!(store.names(path).unwrap().len(), 1);

        store.remove(path, "com.apple.file-provider.evicted").unwrap();
        assert!(store.names(path).unwrap().is_empty());
        assert!(store.remove(path, "com.apple.file-provider.evicted").is_err());
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_unlistable_fails_names_only() {
        let path = Path::new("/cloud/a.txt");
        let store = MemoryStore::new()
            .with(path, "com.apple.file-provider.materialized", b"1")
            .unlistable();

        assert!(matches!(store.names(path), Err(Error::PermissionDenied(p)) if p == path));
        assert_eq!(
            store.get(path, "com.apple.file-provider.materialized").unwrap(),
            b"1"
        );
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let path = Path::new("/cloud/a.txt");
        let store = MemoryStore::new()
            .with(path, "com.apple.file-provider.materialized", b"1")
            .read_only();

        assert!(matches!(
            store.set(path, "x", b"1"),
            Err(Error::PermissionDenied(_))
        ));
        assert!(
            store
                .remove(path, "com.apple.file-provider.materialized")
                .is_err()
        );
        assert_eq!(store.writes(), 0);
        assert_eq!(
            store.value(path, "com.apple.file-provider.materialized"),
            Some(b"1".to_vec())
        );
    }
}
