use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

mod memory;
mod xattr;

pub use memory::MemoryStore;
pub use xattr::XattrCli;

/// Read/write access to a file's extended attributes.
///
/// Implementations do no interpretation: they hand back raw names and raw
/// byte values and leave every judgement to the classifier.
pub trait AttributeStore: Send + Sync {
    /// Names of all extended attributes on `path`.
    fn names(&self, path: &Path) -> Result<Vec<String>>;

    /// Raw value of attribute `name`.
    fn get(&self, path: &Path, name: &str) -> Result<Vec<u8>>;

    /// Set attribute `name` to `value`, replacing any previous value.
    fn set(&self, path: &Path, name: &str, value: &[u8]) -> Result<()>;

    /// Remove attribute `name`.
    fn remove(&self, path: &Path, name: &str) -> Result<()>;
}

/// One attribute and its value, or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEntry {
    /// Attribute name
    pub name: String,
    /// Raw value, or the read error
    pub value: std::result::Result<Vec<u8>, String>,
}

impl AttributeEntry {
    /// Value as UTF-8 text, if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        self.value
            .as_ref()
            .ok()
            .and_then(|v| std::str::from_utf8(v).ok())
    }
}

/// Read every attribute on `path` together with its value.
///
/// Fails only if the attribute list itself cannot be read; individual
/// unreadable values are reported inline.
pub fn dump(store: &dyn AttributeStore, path: &Path) -> Result<Vec<AttributeEntry>> {
    let names = store.names(path)?;
    Ok(names
        .into_iter()
        .map(|name| {
            let value = store.get(path, &name).map_err(|e| e.to_string());
            AttributeEntry { name, value }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_dump_reports_unreadable_values_inline() {
        let path = PathBuf::from("/cloud/song.mp3");
        let store = MemoryStore::new()
            .with(&path, "com.apple.file-provider.materialized", b"1")
            .with(&path, "com.apple.quarantine", b"0081;")
            .unreadable("com.apple.quarantine");

        let entries = dump(&store, &path).unwrap();
        assert_eq!(entries.len(), 2);

        let materialized = entries
            .iter()
            .find(|e| e.name == "com.apple.file-provider.materialized")
            .unwrap();
        assert_eq!(materialized.as_text(), Some("1"));

        let quarantine = entries
            .iter()
            .find(|e| e.name == "com.apple.quarantine")
            .unwrap();
        assert!(quarantine.value.is_err());
        assert_eq!(quarantine.as_text(), None);
    }
}
