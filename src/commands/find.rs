use anyhow::{Context as _, Result};
use colored::Colorize;
use icloud::{Client, ScanReport};
use std::path::Path;

use super::resolve_dir;
use crate::Context;
use crate::ui;

/// How many candidates to list before summarising the rest
const SHOWN: usize = 10;

pub fn run(ctx: &Context, dir: Option<&str>) -> Result<()> {
    let client = ctx.client()?;
    let dir = resolve_dir(dir);

    ui::header("Downloaded iCloud Files");
    ui::dim(&dir.display().to_string());
    println!();

    let report = scan(&client, &dir, &[])?;
    print_scan(&report, &dir, listing_limit(ctx));

    if !report.downloaded.is_empty() {
        println!();
        ui::dim("Run 'offload batch <dir>' to evict them");
    }
    Ok(())
}

/// Walk `dir` behind a spinner
pub fn scan(client: &Client, dir: &Path, extensions: &[&str]) -> Result<ScanReport> {
    let pb = ui::spinner("Scanning...");
    let report = client
        .find_downloaded_with_progress(dir, extensions, |n| {
            pb.set_message(format!("Checked {n} files"));
        })
        .with_context(|| format!("Failed to scan {}", dir.display()));
    pb.finish_and_clear();
    report
}

/// How many candidates to list: none with `-q`, all with `-v`
pub fn listing_limit(ctx: &Context) -> usize {
    if ctx.quiet {
        0
    } else if ctx.verbose > 0 {
        usize::MAX
    } else {
        SHOWN
    }
}

/// Print up to `limit` candidates and the scan totals
pub fn print_scan(report: &ScanReport, base: &Path, limit: usize) {
    if report.downloaded.is_empty() {
        ui::success("No downloaded iCloud files found");
    } else if limit > 0 {
        for file in report.downloaded.iter().take(limit) {
            let rel = file.path.strip_prefix(base).unwrap_or(&file.path);
            println!(
                "  {} {:>9} {}",
                "●".green(),
                ui::format_size(file.size).dimmed(),
                rel.display()
            );
        }
        if report.downloaded.len() > limit {
            ui::dim(&format!("... and {} more", report.downloaded.len() - limit));
        }
    }

    println!();
    ui::kv("Files checked", &report.files_checked.to_string());
    ui::kv("iCloud files", &report.cloud_files.to_string());
    ui::kv(
        "Downloaded",
        &format!(
            "{} ({})",
            report.downloaded.len(),
            ui::format_size(report.downloaded_bytes())
        ),
    );
    ui::kv("Placeholders", &report.placeholders.len().to_string());
    if !report.sidecars.is_empty() {
        ui::kv("Legacy .icloud stubs", &report.sidecars.len().to_string());
    }
    if !report.in_transfer.is_empty() {
        ui::kv("Transferring", &report.in_transfer.len().to_string());
    }

    if !report.errors.is_empty() {
        ui::warn(&format!("Skipped {} paths due to errors", report.errors.len()));
        for (path, error) in report.errors.iter().take(SHOWN) {
            ui::dim(&format!("{}: {}", path.display(), error));
        }
    }
}
