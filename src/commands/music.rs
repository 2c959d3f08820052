use anyhow::Result;

use super::batch::{evict_with_progress, print_summary};
use super::find::scan;
use crate::Context;
use crate::ui;

/// Extensions treated as music
pub const MUSIC_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "flac", "wav", "ogg", "wma"];

/// Candidates listed before asking
const SAMPLE: usize = 10;

pub fn run(ctx: &Context, yes: bool) -> Result<()> {
    let client = ctx.client()?;
    let root = client.cloud_root().to_path_buf();

    ui::header("Evict Music");

    if !root.exists() {
        ui::error(&format!("iCloud Drive not found: {}", root.display()));
        return Ok(());
    }
    ui::dim(&format!("Searching {}", root.display()));
    println!();

    let report = scan(&client, &root, MUSIC_EXTENSIONS)?;

    ui::kv("Music files", &report.files_checked.to_string());
    ui::kv("Downloaded", &report.downloaded.len().to_string());
    ui::kv("Placeholders", &report.placeholders.len().to_string());

    if report.downloaded.is_empty() {
        println!();
        ui::success("No downloaded music files found, nothing to evict");
        return Ok(());
    }

    ui::section("Sample");
    for (i, file) in report.downloaded.iter().take(SAMPLE).enumerate() {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {:>2}. {} ({})", i + 1, name, ui::format_size(file.size));
    }
    if report.downloaded.len() > SAMPLE {
        ui::dim(&format!("... and {} more", report.downloaded.len() - SAMPLE));
    }

    println!();
    ui::warn(&format!(
        "This will evict {} music files ({}) from local storage.",
        report.downloaded.len(),
        ui::format_size(report.downloaded_bytes())
    ));
    ui::dim("They stay in iCloud but stop taking local disk space.");

    if !yes && !ui::confirm("Continue?", false)? {
        ui::info("Cancelled");
        return Ok(());
    }

    let batch = evict_with_progress(&client, &report.downloaded, &root);
    print_summary(&batch);

    if batch.succeeded > 0 {
        ui::dim("Evicted files show a cloud icon in Finder");
    }
    if batch.failed > 0 {
        ui::section("Failed evictions are usually caused by");
        ui::dim("files currently open in another app");
        ui::dim("files that have not finished uploading");
        ui::dim("network connectivity issues");
    }
    Ok(())
}
