use anyhow::{Context as _, Result};

use super::expand_path;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, path: &str) -> Result<()> {
    let client = ctx.client()?;
    let path = expand_path(path);

    ui::header("Anti-Redownload Protection");

    if !path.exists() {
        ui::error(&format!("Path not found: {}", path.display()));
        return Ok(());
    }

    if path.is_dir() {
        ui::info(&format!("Setting policies for all iCloud files in {}", path.display()));
    }

    let count = client
        .protect(&path)
        .with_context(|| format!("Failed to protect {}", path.display()))?;

    match (path.is_dir(), count) {
        (false, 0) => ui::warn("Not an iCloud file, or no policy could be written"),
        (false, _) => ui::success(&format!("Protected {}", path.display())),
        (true, n) => ui::success(&format!("Set anti-redownload policies on {n} iCloud files")),
    }
    Ok(())
}
