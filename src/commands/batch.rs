use anyhow::Result;
use colored::Colorize;
use icloud::{BatchReport, Client, FileStatus};
use std::path::{Path, PathBuf};

use super::evict::outcome_label;
use super::find::{listing_limit, print_scan, scan};
use super::resolve_dir;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, dir: Option<&str>, yes: bool) -> Result<()> {
    let client = ctx.client()?;
    let dir = resolve_dir(dir);

    ui::header("Batch Evict");
    ui::dim(&dir.display().to_string());
    println!();

    let report = scan(&client, &dir, &[])?;
    print_scan(&report, &dir, listing_limit(ctx));

    if report.downloaded.is_empty() {
        return Ok(());
    }

    println!();
    if !yes
        && !ui::confirm(
            &format!("Remove downloads from {} files?", report.downloaded.len()),
            false,
        )?
    {
        ui::info("Cancelled");
        return Ok(());
    }

    let batch = evict_with_progress(&client, &report.downloaded, &dir);
    print_summary(&batch);
    Ok(())
}

/// Evict `files` one at a time behind a progress bar
pub fn evict_with_progress(client: &Client, files: &[FileStatus], base: &Path) -> BatchReport {
    let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
    let label = |path: &Path| {
        let rel = path.strip_prefix(base).unwrap_or(path);
        ui::truncate_path(&rel.display().to_string(), 30)
    };

    let pb = ui::progress_bar(paths.len());
    if let Some(first) = paths.first() {
        pb.set_message(label(first));
    }

    let batch = client.evict_all(&paths, |index, batch| {
        if let Some(report) = batch.reports.last().filter(|r| r.path == paths[index]) {
            if !report.success {
                let rel = report.path.strip_prefix(base).unwrap_or(&report.path);
                let mark = if report.outcome.is_noop() {
                    "-".dimmed()
                } else {
                    "✗".red()
                };
                pb.suspend(|| {
                    println!("  {} {} ({})", mark, rel.display(), outcome_label(report.outcome));
                });
            }
        } else if let Some((path, error)) = batch.errors.last() {
            let rel = path.strip_prefix(base).unwrap_or(path);
            pb.suspend(|| println!("  {} {} ({})", "✗".red(), rel.display(), error));
        }

        pb.inc(1);
        if let Some(next) = paths.get(index + 1) {
            pb.set_message(label(next));
        }
    });

    pb.finish_and_clear();
    batch
}

/// Print batch totals
pub fn print_summary(batch: &BatchReport) {
    println!();
    if batch.is_success() {
        ui::success(&format!(
            "Evicted {} files, freed about {}",
            batch.succeeded,
            ui::format_size(batch.bytes)
        ));
    } else {
        ui::warn(&format!(
            "Evicted {}/{} files ({} failed)",
            batch.succeeded,
            batch.total(),
            batch.failed
        ));
    }
    if batch.skipped > 0 {
        ui::dim(&format!("{} files skipped (not iCloud files)", batch.skipped));
    }
}
