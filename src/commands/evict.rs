use anyhow::{Context as _, Result};
use colored::{ColoredString, Colorize};
use icloud::{EvictionOutcome, EvictionReport, Signal};

use super::expand_path;
use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, path: &str) -> Result<()> {
    let client = ctx.client()?;
    let path = expand_path(path);

    ui::header("Evict");
    ui::dim("Removing the local copy, the file stays in iCloud");
    println!();

    let report = client
        .evict(&path)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;
    print_report(&report);

    Ok(())
}

/// Short coloured label for an outcome
pub fn outcome_label(outcome: EvictionOutcome) -> ColoredString {
    match outcome {
        EvictionOutcome::NotCloudFile => "not an iCloud file".dimmed(),
        EvictionOutcome::AlreadyEvicted => "already evicted".blue(),
        EvictionOutcome::Confirmed => "evicted".green(),
        EvictionOutcome::ConfirmedAfterDelay => "evicted (after delay)".green(),
        EvictionOutcome::ConfirmedByFinalCheck => "evicted (final check)".green(),
        EvictionOutcome::Unconfirmed => "not confirmed".red(),
    }
}

/// Print one eviction report, including every strategy tried
pub fn print_report(report: &EvictionReport) {
    ui::kv("File", &report.path.display().to_string());
    ui::kv("Size", &ui::format_size(report.original_size));

    if !report.attempts.is_empty() {
        ui::section("Attempts");
        for attempt in &report.attempts {
            let mark = if attempt.verification.confirmed {
                "✓".green()
            } else if attempt.executed {
                "~".yellow()
            } else {
                "✗".red()
            };
            println!(
                "  {} {:<7} {}",
                mark,
                attempt.strategy,
                attempt.verification.reason.dimmed()
            );
        }
        println!();
    }

    match report.outcome {
        EvictionOutcome::NotCloudFile => {
            ui::info("Not an iCloud file, left untouched");
        }
        EvictionOutcome::AlreadyEvicted => {
            ui::info("Already evicted (cloud-only)");
        }
        outcome if outcome.is_success() => {
            ui::success(&format!(
                "{} via {}: {}",
                outcome_label(outcome),
                report.strategy.as_deref().unwrap_or("?"),
                report.message
            ));
            if policy_only(report) {
                ui::dim("Confirmed by policy attributes only, the local content may remain");
            }
        }
        _ => {
            ui::warn(&format!("Could not confirm eviction: {}", report.message));
            if let Some(status) = &report.final_status {
                super::status::print_status(status);
            }
            ui::dim("Try Finder: right-click the file and choose Remove Download");
        }
    }
}

/// True when the confirming verification rests on policy metadata alone.
fn policy_only(report: &EvictionReport) -> bool {
    report
        .attempts
        .iter()
        .find(|a| a.verification.confirmed)
        .is_some_and(|a| !a.verification.signals.iter().copied().any(Signal::is_content_based))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use icloud::{StrategyAttempt, Verification};

    use super::*;

    fn report(attempts: Vec<StrategyAttempt>) -> EvictionReport {
        EvictionReport {
            path: PathBuf::from("/cloud/a.mp3"),
            strategy: Some("xattr".to_string()),
            success: true,
            message: String::new(),
            outcome: EvictionOutcome::Confirmed,
            original_size: 50_000,
            attempts,
            final_status: None,
        }
    }

    fn attempt(strategy: &str, confirmed: bool, signals: Vec<Signal>) -> StrategyAttempt {
        StrategyAttempt {
            strategy: strategy.to_string(),
            executed: true,
            verification: Verification {
                confirmed,
                signals,
                reason: String::new(),
            },
        }
    }

    #[test]
    fn test_policy_only_verdict() {
        let weak = report(vec![
            attempt("evict", false, vec![]),
            attempt("xattr", true, vec![Signal::PolicyApplied]),
        ]);
        assert!(policy_only(&weak));

        let strong = report(vec![attempt(
            "brctl",
            true,
            vec![Signal::SizeShrunk, Signal::Placeholder],
        )]);
        assert!(!policy_only(&strong));

        assert!(!policy_only(&report(vec![attempt("xattr", false, vec![])])));
        assert!(!policy_only(&report(vec![])));
    }
}
