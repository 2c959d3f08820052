//! Directory walks for discovery and bulk policy setting.
//!
//! Walks hold no lock on the tree; files may change between listing and
//! classification. Errors on individual entries are collected, never
//! raised.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::sidecar;
use crate::types::ScanReport;

/// A regular file found by the walk, or a sidecar standing in for one.
#[derive(Debug)]
pub(crate) enum Entry {
    File(PathBuf),
    Sidecar(PathBuf),
}

/// Walk `root` in name order, yielding regular files and sidecars.
///
/// AppleDouble (`._*`) and other hidden files are skipped. Walk errors are
/// pushed to `errors`.
pub(crate) fn walk(root: &Path, errors: &mut Vec<(PathBuf, String)>) -> Result<Vec<Entry>> {
    if !root.exists() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                errors.push((path, e.to_string()));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if let Some(original) = sidecar::original_path(path) {
            entries.push(Entry::Sidecar(original));
            continue;
        }

        let hidden = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'));
        if hidden {
            continue;
        }

        entries.push(Entry::File(path.to_path_buf()));
    }
    Ok(entries)
}

/// Returns true if `path` has one of `extensions` (case-insensitive).
/// An empty list matches everything.
pub(crate) fn matches_extension(path: &Path, extensions: &[&str]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Find downloaded iCloud files under `root`.
pub(crate) fn find_downloaded(
    classifier: &Classifier,
    root: &Path,
    extensions: &[&str],
    mut progress: impl FnMut(usize),
) -> Result<ScanReport> {
    let mut report = ScanReport::default();
    let entries = walk(root, &mut report.errors)?;

    for entry in entries {
        let path = match entry {
            Entry::Sidecar(original) => {
                if matches_extension(&original, extensions) {
                    report.sidecars.push(original);
                }
                continue;
            }
            Entry::File(path) => path,
        };

        if !matches_extension(&path, extensions) {
            continue;
        }

        report.files_checked += 1;
        progress(report.files_checked);

        let status = match classifier.classify(&path) {
            Ok(s) => s,
            Err(e) => {
                report.errors.push((path, e.to_string()));
                continue;
            }
        };

        if !status.is_cloud_file {
            continue;
        }
        report.cloud_files += 1;

        if status.is_downloading {
            report.in_transfer.push(status.path.clone());
        }
        if status.is_evictable() {
            log::debug!("downloaded iCloud file: {}", status.path.display());
            report.downloaded.push(status);
        } else {
            log::debug!("placeholder: {}", status.path.display());
            report.placeholders.push(status.path);
        }
    }

    Ok(report)
}
