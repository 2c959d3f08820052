use anyhow::Result;
use colored::Colorize;
use icloud::{CLOUD_DOCS, Client};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::Context;
use crate::ui;

/// External tools the strategies rely on
const TOOLS: &[(&str, &str)] = &[
    ("brctl", "iCloud cache control"),
    ("xattr", "extended attributes"),
    ("osascript", "Finder scripting"),
    ("evict", "third-party evict command"),
];

pub fn run(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    ui::header("iCloud Diagnostics");

    ui::section("Locations");
    for (name, path) in locations(&client) {
        if path.is_dir() {
            println!("  {} {}: {}", "✓".green(), name, path.display());
            for file in first_files(&path, 3) {
                print_file_line(&client, &file);
            }
        } else {
            println!(
                "  {} {}: {} {}",
                "✗".red(),
                name,
                path.display(),
                "(not found)".dimmed()
            );
        }
    }

    ui::section("Tools");
    let runner = client.runner();
    for (tool, desc) in TOOLS {
        if runner.exists(tool) {
            println!("  {} {} - {}", "✓".green(), tool, desc.dimmed());
        } else {
            println!("  {} {} - {} {}", "✗".red(), tool, desc, "(missing)".red());
        }
    }
    ui::kv("Strategy order", &client.strategy_names().join(" → "));

    ui::section("Current directory");
    let cwd = std::env::current_dir()?;
    ui::kv("Path", &cwd.display().to_string());
    for file in first_files(&cwd, 5) {
        match client.status(&file) {
            Ok(status) => {
                println!("  📄 {}", display_name(&file));
                ui::kv("    iCloud file", &ui::yes_no(status.is_cloud_file).to_string());
                ui::kv("    Downloaded", &ui::yes_no(status.is_downloaded).to_string());
                ui::kv("    Attributes", &format!("{:?}", status.attributes));
            }
            Err(e) => ui::dim(&format!("{}: {e}", display_name(&file))),
        }
    }

    Ok(())
}

fn locations(client: &Client) -> Vec<(&'static str, PathBuf)> {
    let home = dirs::home_dir().unwrap_or_default();
    let mobile = CLOUD_DOCS
        .rsplit_once('/')
        .map_or_else(|| home.join(CLOUD_DOCS), |(parent, _)| home.join(parent));
    vec![
        ("Desktop", dirs::desktop_dir().unwrap_or_else(|| home.join("Desktop"))),
        ("Documents", dirs::document_dir().unwrap_or_else(|| home.join("Documents"))),
        ("Downloads", dirs::download_dir().unwrap_or_else(|| home.join("Downloads"))),
        ("Mobile Documents", mobile),
        ("iCloud Drive", client.cloud_root().to_path_buf()),
    ]
}

/// First `limit` regular, non-hidden files directly inside `dir`
fn first_files(dir: &Path, limit: usize) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .take(limit)
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_file_line(client: &Client, file: &Path) {
    match client.status(file) {
        Ok(status) => {
            let kind = if !status.is_cloud_file {
                "Local".dimmed()
            } else if status.is_downloaded {
                "iCloud - Downloaded".green()
            } else {
                "iCloud - Placeholder".blue()
            };
            println!(
                "      {} - {} ({} attrs)",
                display_name(file),
                kind,
                status.attributes.len()
            );
        }
        Err(e) => println!("      {} - {}", display_name(file), e.to_string().red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_files_skips_dirs_and_hidden() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/deep.txt"), b"x").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"x").unwrap();
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = first_files(dir.path(), 3);
        let names: Vec<_> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }
}
