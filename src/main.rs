use anyhow::Result;
use clap::Parser;

use recap::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Recap {
            date,
            stdout,
            no_summarize,
        }) => commands::recap::run(date, stdout, no_summarize).await,
        Some(Commands::Sources) => commands::sources::run().await,
        Some(Commands::Usage { date }) => commands::usage::run(date).await,
        // Bare `recap` builds today's note.
        None => commands::recap::run(None, false, false).await,
    }
}
