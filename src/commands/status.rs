use anyhow::{Context as _, Result};
use icloud::FileStatus;

use super::expand_path;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, path: &str, json: bool) -> Result<()> {
    let client = ctx.client()?;
    let path = expand_path(path);

    let status = client
        .status(&path)
        .with_context(|| format!("Could not get status of {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    ui::header("File Status");
    print_status(&status);
    if !status.is_cloud_file && !client.is_in_icloud(&path) {
        ui::dim(&format!(
            "Outside the iCloud Drive folder ({})",
            client.cloud_root().display()
        ));
    }
    Ok(())
}

/// Print a classification record
pub fn print_status(status: &FileStatus) {
    ui::kv("Path", &status.path.display().to_string());
    ui::kv("iCloud file", &ui::yes_no(status.is_cloud_file).to_string());
    ui::kv("Downloaded", &ui::yes_no(status.is_downloaded).to_string());
    ui::kv("Downloading", &ui::yes_no(status.is_downloading).to_string());
    ui::kv("Placeholder", &ui::yes_no(status.is_placeholder).to_string());
    ui::kv(
        "Size",
        &format!("{} ({} bytes)", ui::format_size(status.size), status.size),
    );
    if status.attributes.is_empty() {
        ui::kv("Attributes", "none");
    } else {
        ui::kv("Attributes", &status.attributes.join(", "));
    }
}
