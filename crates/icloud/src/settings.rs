use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How to read a materialized attribute whose value is neither a known
/// truthy nor a known falsy token.
///
/// Providers do not document their encodings, so this is a guess that may
/// need recalibrating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValuePolicy {
    /// Treat the file as downloaded. Avoids re-evicting an already evicted
    /// file on the strength of metadata we do not understand.
    #[default]
    Downloaded,
    /// Treat the file as not downloaded.
    NotDownloaded,
}

/// Tunables for classification, verification and retry timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Wait before re-classifying a file after an eviction attempt.
    pub settle_delay: Duration,
    /// Extra wait before the delayed re-verification once every strategy
    /// has been tried.
    pub recheck_delay: Duration,
    /// Files at or below this size are never content-probed.
    pub probe_min_size: u64,
    /// Maximum number of bytes read by the content probe.
    pub probe_read_limit: u64,
    /// Size above which short or failed reads mark a placeholder.
    pub large_file_size: u64,
    /// A read shorter than this on a large file marks a placeholder.
    pub partial_read_floor: u64,
    /// New size below `original * shrink_ratio` confirms an eviction.
    pub shrink_ratio: f64,
    /// Reading of unrecognized materialized values.
    pub unrecognized_value: ValuePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            recheck_delay: Duration::from_secs(5),
            probe_min_size: 1024,
            probe_read_limit: 2048,
            large_file_size: 10_000,
            partial_read_floor: 1000,
            shrink_ratio: 0.1,
            unrecognized_value: ValuePolicy::Downloaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.settle_delay, Duration::from_secs(2));
        assert_eq!(settings.recheck_delay, Duration::from_secs(5));
        assert_eq!(settings.probe_min_size, 1024);
        assert_eq!(settings.probe_read_limit, 2048);
        assert_eq!(settings.unrecognized_value, ValuePolicy::Downloaded);
    }
}
