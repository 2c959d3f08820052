//! Extended attribute names used by the two provider schemas.
//!
//! Apple ships File Provider (`com.apple.file-provider.*`) and the older
//! CloudDocs daemon (`com.apple.clouddocs.*`, `com.apple.icloud.*`). Which
//! keys a given macOS release honours is undocumented, so readers check
//! every known spelling and writers set all of them.

/// Substrings that mark an attribute as owned by a cloud provider.
pub const CLOUD_INDICATORS: &[&str] = &[
    "com.apple.file-provider",
    "com.apple.icloud",
    "com.apple.CloudDocs",
    "com.apple.clouddocs",
];

/// Attributes whose value says whether content is materialized locally.
/// Checked in order; the first one present decides.
pub const MATERIALIZED: &[&str] = &[
    "com.apple.file-provider.materialized",
    "com.apple.icloud.materialized",
];

/// Attributes whose presence means a transfer is in flight.
pub const DOWNLOADING: &[&str] = &[
    "com.apple.file-provider.downloading",
    "com.apple.icloud.downloading",
];

/// Attributes whose presence explicitly marks a placeholder.
pub const PLACEHOLDER: &[&str] = &[
    "com.apple.icloud.placeholder",
    "com.apple.file-provider.placeholder",
];

/// Attributes left behind by an anti-redownload policy write.
pub const POLICY: &[&str] = &[
    "com.apple.file-provider.download-policy",
    "com.apple.clouddocs.download-policy",
    "com.apple.file-provider.auto-download",
    "com.apple.clouddocs.auto-download",
    "com.apple.file-provider.evicted",
];

/// Values that mean "materialized".
pub const TRUTHY: &[&[u8]] = &[b"1", b"true", b"True"];

/// Values that mean "not materialized".
pub const FALSY: &[&[u8]] = &[b"0", b"false", b"False"];

/// Download policy, auto-download and evicted markers, each in every known
/// encoding.
pub const EVICTION_MARKERS: &[(&str, &[u8])] = &[
    ("com.apple.file-provider.download-policy", b"never"),
    ("com.apple.file-provider.download-policy", b"0"),
    ("com.apple.clouddocs.download-policy", b"never"),
    ("com.apple.clouddocs.download-policy", b"0"),
    ("com.apple.file-provider.auto-download", b"0"),
    ("com.apple.file-provider.auto-download", b"false"),
    ("com.apple.clouddocs.auto-download", b"0"),
    ("com.apple.clouddocs.auto-download", b"false"),
    ("com.apple.file-provider.evicted", b"1"),
    ("com.apple.file-provider.evicted", b"true"),
];

/// Marks the file as not materialized.
pub const NOT_MATERIALIZED: &[(&str, &[u8])] = &[
    ("com.apple.file-provider.materialized", b"0"),
    ("com.apple.file-provider.materialized", b"false"),
];

/// Marks the file as a placeholder.
pub const AS_PLACEHOLDER: &[(&str, &[u8])] = &[
    ("com.apple.file-provider.placeholder", b"1"),
    ("com.apple.file-provider.placeholder", b"true"),
];

/// Returns true if `name` belongs to a cloud provider namespace.
pub fn is_cloud_attribute(name: &str) -> bool {
    CLOUD_INDICATORS.iter().any(|indicator| name.contains(indicator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cloud_attribute() {
        assert!(is_cloud_attribute("com.apple.file-provider.materialized"));
        assert!(is_cloud_attribute("com.apple.clouddocs.auto-download"));
        assert!(is_cloud_attribute("com.apple.CloudDocs.whatever"));
        assert!(!is_cloud_attribute("com.apple.quarantine"));
        assert!(!is_cloud_attribute("com.apple.metadata:kMDItemWhereFroms"));
        assert!(!is_cloud_attribute("com.dropbox.attrs"));
    }

    #[test]
    fn test_write_lists_target_both_namespaces() {
        assert!(
            EVICTION_MARKERS
                .iter()
                .any(|(name, _)| name.starts_with("com.apple.clouddocs."))
        );
        assert!(
            EVICTION_MARKERS
                .iter()
                .any(|(name, _)| name.starts_with("com.apple.file-provider."))
        );
        assert!(
            EVICTION_MARKERS
                .iter()
                .chain(NOT_MATERIALIZED)
                .chain(AS_PLACEHOLDER)
                .all(|(name, _)| is_cloud_attribute(name))
        );
    }
}
