use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "offload")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Free local disk space by evicting iCloud Drive files (they stay in iCloud)",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Seconds to wait before verifying an eviction
    #[arg(long, global = true, value_name = "SECS")]
    pub settle_secs: Option<u64>,

    /// Seconds to wait before the final recheck
    #[arg(long, global = true, value_name = "SECS")]
    pub recheck_secs: Option<u64>,

    /// Treat unrecognized materialized values as not downloaded
    #[arg(long, global = true)]
    pub strict_values: bool,

    /// Override the iCloud Drive root
    #[arg(long, global = true, value_name = "DIR")]
    pub cloud_root: Option<String>,

    /// Command to run (interactive menu when omitted)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Evict a single file
    Evict {
        /// File to evict
        path: String,
    },

    /// Find downloaded iCloud files under a directory
    Find {
        /// Directory to search (default: ~/Desktop)
        dir: Option<String>,
    },

    /// Find and evict every downloaded iCloud file under a directory
    Batch {
        /// Directory to search (default: ~/Desktop)
        dir: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show how a file classifies
    Status {
        /// File to inspect
        path: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check locations, tools and nearby files
    Diagnose,

    /// Dump every extended attribute of a file
    Attrs {
        /// File to inspect
        path: String,
    },

    /// Evict downloaded music files across iCloud Drive
    Music {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark a file or every iCloud file under a directory as never download
    Protect {
        /// File or directory
        path: String,
    },

    /// Interactive menu
    Menu,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_command_means_menu() {
        let cli = Cli::try_parse_from(["offload"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "offload",
            "batch",
            "~/Music",
            "--yes",
            "-vv",
            "--settle-secs",
            "0",
            "--strict-values",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settle_secs, Some(0));
        assert!(cli.strict_values);
        match cli.command {
            Some(Command::Batch { dir, yes }) => {
                assert_eq!(dir.as_deref(), Some("~/Music"));
                assert!(yes);
            }
            _ => panic!("expected batch"),
        }
    }

    #[test]
    fn test_status_json() {
        let cli = Cli::try_parse_from(["offload", "status", "a.txt", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Status { json: true, .. })
        ));
    }
}
