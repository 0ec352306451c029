use anyhow::Result;

use super::resolve_window;
use crate::config::load_config;
use crate::recap::render::{render_markdown, render_terminal};
use crate::recap::{assemble, SessionEntry};
use crate::sources::all_sources;
use crate::summarizer::{fallback_summary, SummarizerEngine};
use crate::vault::write_note;

/// Build the daily recap: extract sessions from every available source,
/// summarize each, assemble by project, and write (or print) the note.
pub async fn run(date: Option<String>, to_stdout: bool, no_summarize: bool) -> Result<()> {
    let config = load_config()?;
    let window = resolve_window(date)?;
    let digest_opts = config.digest_options();

    let sources = all_sources();
    let mut sessions = Vec::new();
    for source in &sources {
        if !source.is_available() {
            continue;
        }
        let found = source.sessions(&window, &digest_opts);
        if !found.is_empty() {
            eprintln!(
                "[recap] {}: {} session(s) on {}",
                source.name(),
                found.len(),
                window.date
            );
        }
        sessions.extend(found);
    }

    let engine = if no_summarize {
        None
    } else {
        config
            .summarizer_backend()
            .map(|backend| SummarizerEngine::new(backend, config.summarizer_options()))
    };

    let mut entries = Vec::with_capacity(sessions.len());
    for session in sessions {
        let narrative = match &engine {
            Some(engine) => engine.summarize_session(&session).await,
            None => fallback_summary(&session),
        };
        entries.push(SessionEntry { session, narrative });
    }

    let recap = assemble(&window.date, entries, true);

    if to_stdout {
        render_terminal(&recap);
        return Ok(());
    }

    let note = render_markdown(&recap);
    let path = write_note(&config.vault_dir(), &window.date, &note)?;
    println!("[recap] Note written: {}", path.display());
    Ok(())
}
