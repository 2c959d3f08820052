//! Eviction by rewriting provider attributes directly.
//!
//! Clears the materialized marker, then writes download-policy,
//! auto-download, evicted, not-materialized and placeholder markers in
//! both provider namespaces and every known encoding. Which of these the
//! running provider honours is unknown, so all of them are written and
//! individual refusals are ignored.

use std::path::Path;
use std::sync::Arc;

use super::Strategy;
use crate::attrs::AttributeStore;
use crate::keys;

/// Strategy that writes eviction markers into extended attributes.
pub struct AttributeStrategy {
    store: Arc<dyn AttributeStore>,
}

impl AttributeStrategy {
    /// Create the strategy.
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self { store }
    }

    /// Write every pair in `pairs`, returning how many landed.
    fn write_all(&self, path: &Path, pairs: &[(&str, &[u8])]) -> usize {
        pairs
            .iter()
            .filter(|(name, value)| match self.store.set(path, name, value) {
                Ok(()) => {
                    log::debug!(
                        "set {}={} on {}",
                        name,
                        String::from_utf8_lossy(value),
                        path.display()
                    );
                    true
                }
                Err(e) => {
                    log::debug!("could not set {name}: {e}");
                    false
                }
            })
            .count()
    }
}

impl Strategy for AttributeStrategy {
    fn name(&self) -> &'static str {
        "xattr"
    }

    fn attempt(&self, path: &Path) -> bool {
        if !path.exists() {
            log::warn!("file not found: {}", path.display());
            return false;
        }

        let removed = keys::MATERIALIZED[..1]
            .iter()
            .filter(|name| self.store.remove(path, name).is_ok())
            .count();
        if removed > 0 {
            log::info!("removed materialized attribute from {}", path.display());
        }

        let written = self.write_all(path, keys::EVICTION_MARKERS)
            + self.write_all(path, keys::NOT_MATERIALIZED)
            + self.write_all(path, keys::AS_PLACEHOLDER);

        log::info!(
            "applied {} attribute changes to {}",
            removed + written,
            path.display()
        );
        removed + written > 0
    }
}
