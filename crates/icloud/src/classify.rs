//! File state classification.
//!
//! No public API reports whether an iCloud file's content is materialized,
//! so the state is inferred from attribute metadata, file size and a small
//! read of the content. Evidence is gathered first (all I/O happens there),
//! then a fixed list of pure rules folds it into a [`FileStatus`]. Later
//! rules override earlier ones, which is how readable content wins over
//! stale attributes.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::attrs::AttributeStore;
use crate::error::{Error, Result};
use crate::keys;
use crate::settings::{Settings, ValuePolicy};
use crate::types::FileStatus;

/// Value of the first materialized attribute found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// Raw attribute value
    Value(Vec<u8>),
    /// Attribute listed but its value could not be read
    Unreadable,
}

/// Outcome of reading the head of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// This many bytes came back
    Read(u64),
    /// Open or read failed
    Failed,
}

/// Everything the rules look at.
#[derive(Debug, Clone)]
pub struct Evidence<'a> {
    /// Extended attribute names
    pub attributes: &'a [String],
    /// Size from filesystem metadata
    pub size: u64,
    /// First materialized attribute, if any
    pub materialized: Option<Materialized>,
    /// Content probe, only taken for files above the probe threshold
    pub probe: Option<Probe>,
}

impl Evidence<'_> {
    fn has_any(&self, names: &[&str]) -> bool {
        self.attributes
            .iter()
            .any(|a| names.iter().any(|n| a == n))
    }
}

/// One override rule. Reads evidence, adjusts the status in place.
pub type Rule = fn(&Evidence<'_>, &Settings, &mut FileStatus);

/// Override rules in precedence order; later rules win.
pub const RULES: &[(&str, Rule)] = &[
    ("materialized-attribute", materialized_rule),
    ("downloading-attribute", downloading_rule),
    ("placeholder-attribute", placeholder_attribute_rule),
    ("placeholder-by-elimination", elimination_rule),
    ("content-probe", content_probe_rule),
];

/// Classifies files as local, downloaded iCloud, or placeholder iCloud.
#[derive(Clone)]
pub struct Classifier {
    store: Arc<dyn AttributeStore>,
    cloud_root: PathBuf,
    settings: Settings,
}

impl Classifier {
    /// Create a classifier.
    pub fn new(store: Arc<dyn AttributeStore>, cloud_root: PathBuf, settings: Settings) -> Self {
        Self {
            store,
            cloud_root,
            settings,
        }
    }

    /// The canonical iCloud Drive root.
    pub fn cloud_root(&self) -> &Path {
        &self.cloud_root
    }

    /// Settings in effect.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The attribute store used for reads.
    pub fn store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    /// Returns true if `path` is under the iCloud Drive root.
    pub fn is_in_cloud_root(&self, path: &Path) -> bool {
        path.starts_with(&self.cloud_root)
    }

    /// Classify one file.
    ///
    /// Fails with [`Error::NotFound`] if the path does not exist, and
    /// propagates any failure to list attributes. Files that are neither
    /// under the iCloud root nor carry a provider attribute are returned
    /// immediately with every flag false and are not read.
    pub fn classify(&self, path: &Path) -> Result<FileStatus> {
        let path = crate::expand_and_validate_path(path)?;
        let metadata = std::fs::metadata(&path).map_err(|e| Error::from_io(e, &path))?;
        let size = metadata.len();
        let attributes = self.store.names(&path)?;

        let provider_attrs: Vec<&String> = attributes
            .iter()
            .filter(|a| keys::is_cloud_attribute(a))
            .collect();

        let is_cloud = if !provider_attrs.is_empty() {
            log::debug!("{}: provider attributes {:?}", path.display(), provider_attrs);
            true
        } else if self.is_in_cloud_root(&path) {
            log::debug!("{}: under iCloud Drive root", path.display());
            true
        } else {
            false
        };

        if !is_cloud {
            log::debug!(
                "{}: not an iCloud file (no provider attributes, outside iCloud Drive)",
                path.display()
            );
            return Ok(FileStatus::local(path, size, attributes));
        }

        let evidence = Evidence {
            attributes: &attributes,
            size,
            materialized: self.read_materialized(&path, &attributes),
            probe: (size > self.settings.probe_min_size)
                .then(|| probe_content(&path, size, &self.settings)),
        };

        let mut status = FileStatus {
            path: path.clone(),
            is_cloud_file: true,
            is_downloaded: false,
            is_downloading: false,
            is_placeholder: false,
            size,
            attributes: Vec::new(),
        };
        resolve(&evidence, &self.settings, &mut status);
        status.attributes = attributes;

        Ok(status)
    }

    fn read_materialized(&self, path: &Path, attributes: &[String]) -> Option<Materialized> {
        let name = keys::MATERIALIZED
            .iter()
            .find(|n| attributes.iter().any(|a| a == *n))?;

        match self.store.get(path, name) {
            Ok(value) => {
                log::debug!(
                    "{}: {} = {:?}",
                    path.display(),
                    name,
                    String::from_utf8_lossy(&value)
                );
                Some(Materialized::Value(value))
            }
            Err(e) => {
                log::debug!("{}: could not read {}: {}", path.display(), name, e);
                Some(Materialized::Unreadable)
            }
        }
    }
}

/// Apply every rule in order.
pub fn resolve(evidence: &Evidence<'_>, settings: &Settings, status: &mut FileStatus) {
    for (name, rule) in RULES {
        let before = (status.is_downloaded, status.is_placeholder);
        rule(evidence, settings, status);
        let after = (status.is_downloaded, status.is_placeholder);
        if before != after {
            log::debug!(
                "{}: {} -> downloaded={} placeholder={}",
                status.path.display(),
                name,
                status.is_downloaded,
                status.is_placeholder
            );
        }
    }
    debug_assert!(status.is_downloaded != status.is_placeholder);
}

/// Read up to `probe_read_limit` bytes from the start of the file.
pub fn probe_content(path: &Path, size: u64, settings: &Settings) -> Probe {
    let limit = settings.probe_read_limit.min(size);
    let mut buf = Vec::new();
    match File::open(path).and_then(|f| f.take(limit).read_to_end(&mut buf)) {
        Ok(n) => Probe::Read(n as u64),
        Err(e) => {
            log::debug!("{}: cannot read content: {}", path.display(), e);
            Probe::Failed
        }
    }
}

fn mark_downloaded(status: &mut FileStatus) {
    status.is_downloaded = true;
    status.is_placeholder = false;
}

fn mark_placeholder(status: &mut FileStatus) {
    status.is_downloaded = false;
    status.is_placeholder = true;
}

/// Interpret the first materialized attribute.
pub fn materialized_rule(evidence: &Evidence<'_>, settings: &Settings, status: &mut FileStatus) {
    let Some(materialized) = &evidence.materialized else {
        return;
    };

    status.is_downloaded = match materialized {
        Materialized::Value(v) if keys::TRUTHY.iter().any(|t| *t == v.as_slice()) => true,
        Materialized::Value(v) if keys::FALSY.iter().any(|t| *t == v.as_slice()) => false,
        Materialized::Value(v) if v.is_empty() => false,
        Materialized::Value(v) => {
            log::debug!(
                "{}: unrecognized materialized value {:?}, policy {:?}",
                status.path.display(),
                String::from_utf8_lossy(v),
                settings.unrecognized_value
            );
            settings.unrecognized_value == ValuePolicy::Downloaded
        }
        Materialized::Unreadable => false,
    };
}

/// Presence of a transfer attribute.
pub fn downloading_rule(evidence: &Evidence<'_>, _settings: &Settings, status: &mut FileStatus) {
    status.is_downloading = evidence.has_any(keys::DOWNLOADING);
}

/// An explicit placeholder attribute beats the materialized value.
pub fn placeholder_attribute_rule(
    evidence: &Evidence<'_>,
    _settings: &Settings,
    status: &mut FileStatus,
) {
    if evidence.has_any(keys::PLACEHOLDER) {
        mark_placeholder(status);
    }
}

/// An iCloud file that is not downloaded must be a placeholder.
pub fn elimination_rule(_evidence: &Evidence<'_>, _settings: &Settings, status: &mut FileStatus) {
    if !status.is_downloaded {
        status.is_placeholder = true;
    }
}

/// Readable content is ground truth; empty or failed reads of a file that
/// claims to be large mean the size is metadata only.
pub fn content_probe_rule(evidence: &Evidence<'_>, settings: &Settings, status: &mut FileStatus) {
    let Some(probe) = evidence.probe else {
        return;
    };
    let size = evidence.size;
    if size <= settings.probe_min_size {
        return;
    }

    match probe {
        Probe::Read(0) => mark_placeholder(status),
        Probe::Read(n) if n >= settings.probe_min_size.min(size) => mark_downloaded(status),
        Probe::Read(n) if size > settings.large_file_size && n < settings.partial_read_floor => {
            mark_placeholder(status);
        }
        Probe::Read(_) => {}
        Probe::Failed if size > settings.large_file_size => mark_placeholder(status),
        Probe::Failed => {}
    }
}
