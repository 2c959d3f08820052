mod cli;
mod commands;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use icloud::{Client, Settings, ValuePolicy};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub settings: Settings,
    pub cloud_root: Option<PathBuf>,
}

impl Context {
    /// Build an iCloud client honouring the global flags.
    pub fn client(&self) -> Result<Client> {
        let mut builder = Client::builder().settings(self.settings.clone());
        if let Some(root) = &self.cloud_root {
            builder = builder.cloud_root(root);
        }
        builder.build().context("Failed to initialize iCloud client")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let mut settings = Settings::default();
    if let Some(secs) = cli.settle_secs {
        settings.settle_delay = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.recheck_secs {
        settings.recheck_delay = Duration::from_secs(secs);
    }
    if cli.strict_values {
        settings.unrecognized_value = ValuePolicy::NotDownloaded;
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        settings,
        cloud_root: cli.cloud_root.as_deref().map(commands::expand_path),
    };

    match cli.command.unwrap_or(Command::Menu) {
        Command::Evict { path } => commands::evict::run(&ctx, &path),
        Command::Find { dir } => commands::find::run(&ctx, dir.as_deref()),
        Command::Batch { dir, yes } => commands::batch::run(&ctx, dir.as_deref(), yes),
        Command::Status { path, json } => commands::status::run(&ctx, &path, json),
        Command::Diagnose => commands::diagnose::run(&ctx),
        Command::Attrs { path } => commands::attrs::run(&ctx, &path),
        Command::Music { yes } => commands::music::run(&ctx, yes),
        Command::Protect { path } => commands::protect::run(&ctx, &path),
        Command::Menu => commands::menu::run(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "offload", &mut io::stdout());
            Ok(())
        }
    }
}
