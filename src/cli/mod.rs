pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "recap",
    version,
    about = "Daily recap of AI coding assistant sessions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the recap note for a day (default command)
    Recap {
        /// Day to recap as YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Print to the terminal instead of writing the vault note
        #[arg(long)]
        stdout: bool,
        /// Skip external summarization; use deterministic summaries
        #[arg(long)]
        no_summarize: bool,
    },
    /// List session sources and whether their logs are present
    Sources,
    /// Token and cost totals per source for a day
    Usage {
        /// Day to report as YYYY-MM-DD; defaults to today
        #[arg(long)]
        date: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_recap_flags() {
        let cli = Cli::parse_from(["recap", "recap", "--date", "2026-02-05", "--stdout"]);
        match cli.command {
            Some(Commands::Recap { date, stdout, no_summarize }) => {
                assert_eq!(date.as_deref(), Some("2026-02-05"));
                assert!(stdout);
                assert!(!no_summarize);
            }
            _ => panic!("expected recap subcommand"),
        }
    }

    #[test]
    fn test_cli_defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["recap"]);
        assert!(cli.command.is_none());
    }
}
