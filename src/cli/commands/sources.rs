use anyhow::Result;
use colored::Colorize;

use crate::sources::all_sources;

/// List registered sources and whether their logs are present.
pub async fn run() -> Result<()> {
    println!("\n  {}", "Session sources".bold());
    println!("{}", "  ─────────────────────────────".dimmed());

    for source in all_sources() {
        let status = if source.is_available() {
            "available".green()
        } else {
            "not found".dimmed()
        };
        println!("  {:<14} {}", source.name(), status);
    }
    println!();
    Ok(())
}
