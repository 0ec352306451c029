//! Prompt assembly for session summarization.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::session::Session;

/// Instruction block used when no instructions file is configured or the
/// configured file is unreadable.
pub const DEFAULT_INSTRUCTIONS: &str = "\
You are summarizing one AI coding assistant session for a daily work recap.
Write a short narrative of what was worked on and what came of it. Always
include concrete results: files changed, commands run, bugs found, decisions
made. Prefer specifics from the transcript over generic descriptions. Keep it
under 150 words and do not invent anything that is not in the transcript.";

/// Cap on evidence signals carried into a prompt.
const MAX_EVIDENCE_SIGNALS: usize = 12;

/// Cap on file paths listed in the session context.
const MAX_CONTEXT_FILES: usize = 10;

/// Load the instruction block, fresh on every call.
///
/// Unreadable, missing, or empty files fall back to the embedded default.
pub fn load_instructions(path: Option<&Path>) -> String {
    if let Some(path) = path {
        if let Ok(text) = std::fs::read_to_string(path) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    DEFAULT_INSTRUCTIONS.to_string()
}

/// Structured facts about the session, prepended to every prompt so chunk
/// calls stay grounded even without the full transcript.
pub fn session_context(session: &Session) -> String {
    let mut out = String::new();
    out.push_str("Session context:\n");
    out.push_str(&format!("- Tool: {}\n", session.tool.label()));
    if let Some(project) = session.display_project() {
        out.push_str(&format!("- Project: {}\n", project));
    }
    if let Some(title) = &session.title {
        out.push_str(&format!("- Title: {}\n", title));
    }
    out.push_str(&format!(
        "- Time: {} to {}\n",
        session.started_at.format("%H:%M"),
        session.ended_at.format("%H:%M")
    ));
    if !session.files_touched.is_empty() {
        let shown: Vec<&str> = session
            .files_touched
            .iter()
            .take(MAX_CONTEXT_FILES)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("- Files touched: {}\n", shown.join(", ")));
    }
    if !session.tool_call_summaries.is_empty() {
        let names: Vec<&str> = session
            .tool_call_summaries
            .iter()
            .take(MAX_CONTEXT_FILES)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("- Tool calls: {}\n", names.join("; ")));
    }

    let signals = evidence_signals(&session.conversation_digest);
    if !signals.is_empty() {
        out.push_str(&format!("- Evidence signals: {}\n", signals.join(", ")));
    }
    out
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b")
        .expect("uuid regex")
});

static COMMIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9a-f]{7,40}\b").expect("commit regex"));

static REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\d{1,6}\b").expect("ref regex"));

/// Pull concrete identifiers out of transcript text: UUIDs, commit-like
/// hashes, and PR/issue references, deduplicated in first-seen order.
pub fn evidence_signals(text: &str) -> Vec<String> {
    let mut signals: Vec<String> = Vec::new();
    for m in UUID_RE.find_iter(text) {
        push_signal(&mut signals, m.as_str());
    }
    for m in COMMIT_RE.find_iter(text) {
        // UUID segments also match the hex pattern; skip anything already
        // captured inside a UUID.
        if !signals.iter().any(|s| s.contains(m.as_str())) {
            push_signal(&mut signals, m.as_str());
        }
    }
    for m in REF_RE.find_iter(text) {
        push_signal(&mut signals, m.as_str());
    }
    signals
}

fn push_signal(signals: &mut Vec<String>, candidate: &str) {
    if signals.len() < MAX_EVIDENCE_SIGNALS && !signals.iter().any(|s| s == candidate) {
        signals.push(candidate.to_string());
    }
}

/// Prompt for one transcript slice. `chunk` carries `(index, count)` framing
/// when the transcript was split.
pub fn build_prompt(
    instructions: &str,
    context: &str,
    transcript: &str,
    chunk: Option<(usize, usize)>,
) -> String {
    let framing = match chunk {
        Some((index, count)) => format!(
            "This is chunk {} of {} of the transcript; summarize only what happens here.\n\n",
            index, count
        ),
        None => String::new(),
    };
    format!(
        "{}\n\n{}\n{}Transcript:\n{}",
        instructions, context, framing, transcript
    )
}

/// Prompt combining ordered chunk summaries into one narrative.
pub fn synthesis_prompt(instructions: &str, context: &str, chunk_summaries: &[String]) -> String {
    let mut parts = String::new();
    for (i, summary) in chunk_summaries.iter().enumerate() {
        parts.push_str(&format!("Chunk {} summary:\n{}\n\n", i + 1, summary));
    }
    format!(
        "{}\n\n{}\nThe transcript was summarized in {} sequential chunks. Combine the chunk \
         summaries below into one cohesive narrative of the whole session.\n\n{}",
        instructions,
        context,
        chunk_summaries.len(),
        parts.trim_end()
    )
}
