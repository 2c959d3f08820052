use anyhow::{Context as _, Result};
use colored::Colorize;
use icloud::AttributeEntry;

use super::expand_path;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, path: &str) -> Result<()> {
    let client = ctx.client()?;
    let path = expand_path(path);

    let entries = client
        .attributes(&path)
        .with_context(|| format!("Could not read attributes of {}", path.display()))?;
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    ui::header("Extended Attributes");
    ui::kv("Path", &path.display().to_string());
    ui::kv("Size", &format!("{size} bytes"));
    ui::kv("Attributes", &entries.len().to_string());

    if entries.is_empty() {
        println!();
        ui::warn("No extended attributes found");
    } else {
        println!();
        for entry in &entries {
            println!("  {} = {}", entry.name.cyan(), format_value(entry));
        }
    }

    ui::section("Analysis");
    match client.status(&path) {
        Ok(status) => super::status::print_status(&status),
        Err(e) => ui::warn(&format!("Could not classify: {e}")),
    }

    ui::section("ls -la@");
    let listing = path
        .to_str()
        .context("Path is not valid UTF-8")
        .and_then(|p| {
            client
                .runner()
                .run_checked("ls", &["-la@", p])
                .map_err(anyhow::Error::from)
        });
    match listing {
        Ok(out) => {
            for line in out.lines() {
                println!("  {line}");
            }
        }
        Err(e) => ui::dim(&format!("ls failed: {e}")),
    }

    Ok(())
}

fn format_value(entry: &AttributeEntry) -> String {
    match (&entry.value, entry.as_text()) {
        (Ok(_), Some(text)) => format!("'{text}'"),
        (Ok(bytes), None) => format!("{bytes:?} {}", "(raw bytes)".dimmed()),
        (Err(e), _) => format!("(could not read: {e})").red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        colored::control::set_override(false);

        let text = AttributeEntry {
            name: "com.apple.file-provider.materialized".to_string(),
            value: Ok(b"1".to_vec()),
        };
        assert_eq!(format_value(&text), "'1'");

        let raw = AttributeEntry {
            name: "com.apple.quarantine".to_string(),
            value: Ok(vec![0xff, 0x00]),
        };
        assert_eq!(format_value(&raw), "[255, 0] (raw bytes)");

        let unreadable = AttributeEntry {
            name: "com.apple.icloud.materialized".to_string(),
            value: Err("permission denied".to_string()),
        };
        assert_eq!(
            format_value(&unreadable),
            "(could not read: permission denied)"
        );
    }
}
