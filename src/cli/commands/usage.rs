use anyhow::Result;
use colored::Colorize;

use super::resolve_window;
use crate::config::load_config;
use crate::recap::render::{format_cost, format_count};
use crate::sources::all_sources;
use crate::usage::{sum_tokens, TokenUsage};

/// Per-source token and cost totals for one day.
pub async fn run(date: Option<String>) -> Result<()> {
    let config = load_config()?;
    let window = resolve_window(date)?;
    let digest_opts = config.digest_options();

    println!(
        "\n  {}",
        format!("Usage — {}", window.date).cyan().bold()
    );
    println!("{}", "  ─────────────────────────────".dimmed());

    let mut day_usages: Vec<TokenUsage> = Vec::new();
    let mut day_cost = 0.0f64;
    let mut day_sessions = 0usize;

    for source in all_sources() {
        if !source.is_available() {
            continue;
        }
        let sessions = source.sessions(&window, &digest_opts);
        if sessions.is_empty() {
            continue;
        }

        let usages: Vec<TokenUsage> = sessions.iter().map(|s| s.tokens).collect();
        let tokens = sum_tokens(&usages);
        let cost: f64 = sessions.iter().map(|s| s.cost_usd).sum();

        println!(
            "  {:<14} {:>3} session(s)  {:>8} in  {:>8} out  {:>8}",
            source.name().green(),
            sessions.len(),
            format_count(tokens.input),
            format_count(tokens.output),
            format_cost(cost)
        );

        day_sessions += sessions.len();
        day_cost += cost;
        day_usages.push(tokens);
    }

    if day_sessions == 0 {
        println!("  No sessions recorded for this day.\n");
        return Ok(());
    }

    let total = sum_tokens(&day_usages);
    println!("{}", "  ─────────────────────────────".dimmed());
    println!(
        "  {:<14} {:>3} session(s)  {:>8} in  {:>8} out  {:>8}",
        "total".bold(),
        day_sessions,
        format_count(total.input),
        format_count(total.output),
        format_cost(day_cost)
    );
    println!();
    Ok(())
}
