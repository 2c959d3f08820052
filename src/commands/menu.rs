use anyhow::{Context as _, Result};
use colored::Colorize;
use dialoguer::Input;

use crate::Context;
use crate::ui;

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Evict,
    Find,
    Batch,
    Status,
    Diagnose,
    Attrs,
    Music,
    Protect,
    Exit,
}

const CHOICES: &[(Choice, &str)] = &[
    (Choice::Evict, "Remove download from a file"),
    (Choice::Find, "Find downloaded iCloud files in a folder"),
    (Choice::Batch, "Batch remove downloads from a folder"),
    (Choice::Status, "Check file status"),
    (Choice::Diagnose, "Run iCloud diagnostics"),
    (Choice::Attrs, "Show file attributes (detailed)"),
    (Choice::Music, "Evict all music files"),
    (Choice::Protect, "Set anti-redownload policies on a file or folder"),
    (Choice::Exit, "Exit"),
];

/// Map "1".."9" to a choice
fn parse_choice(input: &str) -> Option<Choice> {
    let n: usize = input.trim().parse().ok()?;
    CHOICES.get(n.checked_sub(1)?).map(|(c, _)| *c)
}

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("iCloud Download Manager");
    ui::dim("Only files iCloud manages are touched; everything else is left alone.");
    ui::dim("Evicted files get an anti-redownload policy so they stay evicted.");

    loop {
        ui::section("Options");
        for (i, (_, label)) in CHOICES.iter().enumerate() {
            println!("  {} {}", format!("{}.", i + 1).bold(), label);
        }
        println!();

        let input: String = Input::new()
            .with_prompt(format!("Enter your choice (1-{})", CHOICES.len()))
            .interact_text()
            .context("Failed to read choice")?;

        let Some(choice) = parse_choice(&input) else {
            ui::warn("Invalid choice. Please try again.");
            continue;
        };

        if choice == Choice::Exit {
            ui::info("Goodbye!");
            return Ok(());
        }

        if let Err(e) = dispatch(ctx, choice) {
            ui::error(&format!("{e:#}"));
        }
    }
}

fn dispatch(ctx: &Context, choice: Choice) -> Result<()> {
    match choice {
        Choice::Evict => super::evict::run(ctx, &prompt_path("Enter file path")?),
        Choice::Find => super::find::run(ctx, Some(&prompt_dir()?)),
        Choice::Batch => super::batch::run(ctx, Some(&prompt_dir()?), false),
        Choice::Status => super::status::run(ctx, &prompt_path("Enter file path")?, false),
        Choice::Diagnose => super::diagnose::run(ctx),
        Choice::Attrs => super::attrs::run(ctx, &prompt_path("Enter file path to inspect")?),
        Choice::Music => super::music::run(ctx, false),
        Choice::Protect => {
            super::protect::run(ctx, &prompt_path("Enter file or folder path")?)
        }
        Choice::Exit => Ok(()),
    }
}

fn prompt_path(prompt: &str) -> Result<String> {
    Input::new()
        .with_prompt(prompt)
        .interact_text()
        .context("Failed to read path")
}

/// Folder prompt; empty input means the Desktop
fn prompt_dir() -> Result<String> {
    Input::new()
        .with_prompt("Enter folder path (empty for Desktop)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read folder")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("1"), Some(Choice::Evict));
        assert_eq!(parse_choice(" 7 "), Some(Choice::Music));
        assert_eq!(parse_choice("9"), Some(Choice::Exit));
        assert_eq!(parse_choice("0"), None);
        assert_eq!(parse_choice("10"), None);
        assert_eq!(parse_choice("evict"), None);
        assert_eq!(parse_choice(""), None);
    }
}
