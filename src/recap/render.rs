//! Markdown and terminal rendering for a daily recap.

use colored::Colorize;

use super::{DailyRecap, ProjectRecap, SessionEntry};

/// Render the vault note.
pub fn render_markdown(recap: &DailyRecap) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Daily Recap — {}\n\n", recap.date));

    if recap.projects.is_empty() {
        out.push_str("No coding assistant sessions recorded for this day.\n");
        return out;
    }

    out.push_str(&format!(
        "{} session(s) · {} active · {} tokens · {}\n",
        recap.totals.session_count,
        format_duration(recap.totals.duration_ms),
        format_count(recap.totals.tokens.total),
        format_cost(recap.totals.cost_usd),
    ));

    for project in &recap.projects {
        out.push('\n');
        match &project.path {
            Some(path) => out.push_str(&format!("## {} ({})\n", project.name, path)),
            None => out.push_str(&format!("## {}\n", project.name)),
        }

        if !project.commits.is_empty() {
            out.push_str("\nCommits:\n");
            for commit in &project.commits {
                out.push_str(&format!(
                    "- `{}` {} {}\n",
                    commit.short_hash, commit.time, commit.subject
                ));
            }
        }

        for entry in &project.entries {
            out.push_str(&render_session_markdown(entry));
        }
    }

    out
}

fn render_session_markdown(entry: &SessionEntry) -> String {
    let session = &entry.session;
    let mut out = String::new();

    let heading = session
        .title
        .clone()
        .or_else(|| session.summary.clone())
        .unwrap_or_else(|| session.id.clone());
    out.push_str(&format!(
        "\n### {} — {} ({}–{}, {})\n\n",
        session.tool.label(),
        heading,
        session.started_at.format("%H:%M"),
        session.ended_at.format("%H:%M"),
        format_duration(session.duration_ms),
    ));

    out.push_str(entry.narrative.trim_end());
    out.push('\n');

    if !session.files_touched.is_empty() {
        let files: Vec<&str> = session
            .files_touched
            .iter()
            .take(8)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("\nFiles: {}\n", files.join(", ")));
    }
    if !session.tool_call_summaries.is_empty() {
        let tools: Vec<&str> = session
            .tool_call_summaries
            .iter()
            .take(8)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("Tools: {}\n", tools.join("; ")));
    }
    if !session.tokens.is_empty() {
        out.push_str(&format!(
            "Usage: {} tokens ({} in / {} out) · {}\n",
            format_count(session.tokens.total),
            format_count(session.tokens.input),
            format_count(session.tokens.output),
            format_cost(session.cost_usd),
        ));
    }

    out
}

/// Colored terminal rendering for `--stdout`.
pub fn render_terminal(recap: &DailyRecap) {
    println!(
        "\n  {}",
        format!("Daily Recap — {}", recap.date).cyan().bold()
    );
    println!("{}", "  ─────────────────────────────".dimmed());

    if recap.projects.is_empty() {
        println!("  No coding assistant sessions recorded for this day.\n");
        return;
    }

    println!(
        "  {} {} session(s), {} active, {} tokens, {}\n",
        "Totals:".bold(),
        recap.totals.session_count,
        format_duration(recap.totals.duration_ms),
        format_count(recap.totals.tokens.total),
        format_cost(recap.totals.cost_usd),
    );

    for project in &recap.projects {
        render_project_terminal(project);
    }
}

fn render_project_terminal(project: &ProjectRecap) {
    println!("  {}", project.name.green().bold());
    if !project.commits.is_empty() {
        for commit in &project.commits {
            println!(
                "    {} {} {}",
                commit.short_hash.yellow(),
                commit.time.dimmed(),
                commit.subject
            );
        }
    }
    for entry in &project.entries {
        let session = &entry.session;
        let heading = session
            .title
            .clone()
            .unwrap_or_else(|| session.id.clone());
        println!(
            "    {} {} {}",
            session.tool.label().blue(),
            heading,
            format!(
                "({}–{}, {})",
                session.started_at.format("%H:%M"),
                session.ended_at.format("%H:%M"),
                format_duration(session.duration_ms)
            )
            .dimmed()
        );
        for line in entry.narrative.lines() {
            println!("      {}", line);
        }
    }
    println!();
}

pub fn format_duration(ms: i64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}k", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

pub fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recap::assemble;
    use crate::session::digest::DigestOptions;
    use crate::session::SourceKind;
    use crate::sources::accum::SessionAccumulator;
    use crate::sources::DayWindow;

    fn sample_recap() -> DailyRecap {
        let window = DayWindow::for_date("2026-02-05").unwrap();
        let opts = DigestOptions::default();
        let mut acc = SessionAccumulator::new(SourceKind::Codex, &window, &opts);
        acc.set_project_path("/home/u/api");
        acc.record_user_message(
            Some(window.start + chrono::Duration::seconds(60)),
            "tighten the rate limiter",
        );
        acc.record_tool_call(
            Some(window.start + chrono::Duration::seconds(90)),
            "shell",
            &serde_json::json!({ "command": "cargo test" }),
            None,
        );
        let session = acc.finish("s1").unwrap();
        assemble(
            "2026-02-05",
            vec![super::super::SessionEntry {
                session,
                narrative: "Tuned the limiter and reran the suite.".to_string(),
            }],
            false,
        )
    }

    #[test]
    fn test_markdown_contains_sections() {
        let md = render_markdown(&sample_recap());
        assert!(md.starts_with("# Daily Recap — 2026-02-05"));
        assert!(md.contains("## api (/home/u/api)"));
        assert!(md.contains("### Codex — tighten the rate limiter"));
        assert!(md.contains("Tuned the limiter and reran the suite."));
        assert!(md.contains("Tools: bash: cargo test"));
    }

    #[test]
    fn test_markdown_empty_day() {
        let recap = assemble("2026-02-05", Vec::new(), false);
        let md = render_markdown(&recap);
        assert!(md.contains("No coding assistant sessions recorded"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45_000), "45s");
        assert_eq!(format_duration(301_000), "5m");
        assert_eq!(format_duration(3_900_000), "1h 5m");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(45_200), "45.2k");
        assert_eq!(format_count(1_500_000), "1.5M");
    }
}
