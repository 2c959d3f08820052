use std::path::Path;
use std::sync::Arc;

use crate::attrs::AttributeStore;
use crate::process::CommandRunner;

pub mod brctl;
pub mod evict;
pub mod finder;
pub mod xattr;

pub use brctl::BrctlStrategy;
pub use evict::EvictCommandStrategy;
pub use finder::FinderStrategy;
pub use xattr::AttributeStrategy;

/// One way of asking macOS to drop a file's local copy.
///
/// This trait abstracts the mechanism so the orchestrator can:
/// - Try mechanisms in a fixed order and verify after each
/// - Add new mechanisms without touching the retry loop
/// - Substitute fakes in tests
///
/// `attempt` reports whether the mechanism ran cleanly. That is not proof
/// of eviction; only the verifier decides that. Expected failures (missing
/// tool, non-zero exit, refused attribute write) come back as `false`.
/// Implementations must be safe to call repeatedly and after another
/// strategy has partially succeeded.
pub trait Strategy: Send + Sync {
    /// Short name for reports and logs.
    fn name(&self) -> &'static str;

    /// Request eviction of the local copy of `path`.
    fn attempt(&self, path: &Path) -> bool;
}

/// The built-in strategies in order of observed effectiveness.
pub fn default_strategies(
    store: Arc<dyn AttributeStore>,
    runner: Arc<dyn CommandRunner>,
) -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(BrctlStrategy::new(runner.clone())),
        Box::new(FinderStrategy::new(runner.clone())),
        Box::new(AttributeStrategy::new(store)),
        Box::new(EvictCommandStrategy::new(runner)),
    ]
}
