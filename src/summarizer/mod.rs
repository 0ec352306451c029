//! Session summarization pipeline.
//!
//! A session always gets a summary. The deterministic fallback needs no
//! network; when an external backend is configured the digest is summarized
//! whole, or in fragment-aligned chunks when it exceeds the chunk threshold,
//! with one synthesis call over the ordered chunk summaries. Failures walk
//! an ordered chain: failed synthesis → concatenated chunk summaries; all
//! chunk calls failed → one whole-digest call; that failed too → the
//! deterministic fallback.

pub mod client;
pub mod prompts;

use std::path::PathBuf;

pub use client::{CallFailure, CallOutcome, HttpSummarizer, SummarizeBackend};

use crate::session::digest::{parse_cap_var, truncate_message_text};
use crate::session::Session;

pub const DEFAULT_CHUNK_MAX_CHARS: usize = 7500;
pub const DEFAULT_MAX_CHUNKS: usize = 12;

/// Cap applied to transcript excerpts quoted inside the fallback summary.
const FALLBACK_EXCERPT_CHARS: usize = 200;

/// Structural shape requested for the normalized summary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryShape {
    Prose,
    /// Bullet list bounded to at most this many lines.
    Bullets(usize),
}

#[derive(Debug, Clone)]
pub struct SummarizerOptions {
    /// Chunk threshold in characters; 0 disables chunking.
    pub chunk_max_chars: usize,
    /// Hard cap on chunk count; adjacent chunks merge until it is met.
    pub max_chunks: usize,
    pub instructions_path: Option<PathBuf>,
    pub shape: SummaryShape,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        SummarizerOptions {
            chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
            max_chunks: DEFAULT_MAX_CHUNKS,
            instructions_path: None,
            shape: SummaryShape::Prose,
        }
    }
}

impl SummarizerOptions {
    /// Apply the `RECAP_CHUNK_CHARS` override (0 disables chunking; absent
    /// or invalid keeps the default). Called once at the program boundary.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(chars) = parse_cap_var("RECAP_CHUNK_CHARS") {
            self.chunk_max_chars = chars;
        }
        self
    }
}

pub struct SummarizerEngine<B> {
    backend: B,
    opts: SummarizerOptions,
}

impl<B: SummarizeBackend> SummarizerEngine<B> {
    pub fn new(backend: B, opts: SummarizerOptions) -> Self {
        SummarizerEngine { backend, opts }
    }

    /// Produce the narrative for one session. Never fails; the worst case is
    /// the deterministic fallback summary.
    pub async fn summarize_session(&self, session: &Session) -> String {
        let digest = session.conversation_digest.trim();
        if digest.is_empty() {
            return fallback_summary(session);
        }

        let instructions = prompts::load_instructions(self.opts.instructions_path.as_deref());
        let context = prompts::session_context(session);

        let needs_chunking =
            self.opts.chunk_max_chars > 0 && digest.chars().count() > self.opts.chunk_max_chars;

        let text = if !needs_chunking {
            match self.call_whole(&instructions, &context, digest).await {
                Some(text) => text,
                None => return fallback_summary(session),
            }
        } else {
            let fragments = split_fragments(digest);
            let chunks = chunk_fragments(&fragments, self.opts.chunk_max_chars, self.opts.max_chunks);
            let count = chunks.len();

            let mut chunk_summaries = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let prompt =
                    prompts::build_prompt(&instructions, &context, chunk, Some((i + 1, count)));
                if let Some(text) = self.backend.complete(&prompt).await.into_text() {
                    chunk_summaries.push(text);
                }
            }

            if chunk_summaries.is_empty() {
                match self.call_whole(&instructions, &context, digest).await {
                    Some(text) => text,
                    None => return fallback_summary(session),
                }
            } else {
                let prompt =
                    prompts::synthesis_prompt(&instructions, &context, &chunk_summaries);
                match self.backend.complete(&prompt).await.into_text() {
                    Some(text) => text,
                    None => chunk_summaries.join("\n\n"),
                }
            }
        };

        normalize_summary(&text, self.opts.shape)
    }

    async fn call_whole(&self, instructions: &str, context: &str, digest: &str) -> Option<String> {
        let prompt = prompts::build_prompt(instructions, context, digest, None);
        self.backend.complete(&prompt).await.into_text()
    }
}

/// Deterministic summary used when no summarizer is configured or every
/// external path failed: title, first user message, last assistant message
/// (or key tool calls), and touched files.
pub fn fallback_summary(session: &Session) -> String {
    let mut parts: Vec<String> = Vec::new();

    let mut lead = format!("{} session", session.tool.label());
    if let Some(project) = session.display_project() {
        lead.push_str(&format!(" in {}", project));
    }
    if let Some(title) = &session.title {
        lead.push_str(&format!(": {}", title));
    }
    lead.push('.');
    parts.push(lead);

    let fragments = split_fragments(&session.conversation_digest);
    if let Some(first_user) = fragments.iter().find(|f| f.starts_with("[User]: ")) {
        parts.push(format!(
            "Started with: {}",
            excerpt(first_user.trim_start_matches("[User]: "))
        ));
    }
    if let Some(last_assistant) = fragments
        .iter()
        .rev()
        .find(|f| f.starts_with("[Assistant]: "))
    {
        parts.push(format!(
            "Ended with: {}",
            excerpt(last_assistant.trim_start_matches("[Assistant]: "))
        ));
    } else if !session.tool_call_summaries.is_empty() {
        let names: Vec<&str> = session
            .tool_call_summaries
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        parts.push(format!("Tool activity: {}", names.join("; ")));
    }
    if !session.files_touched.is_empty() {
        let files: Vec<&str> = session
            .files_touched
            .iter()
            .take(5)
            .map(String::as_str)
            .collect();
        parts.push(format!("Files touched: {}", files.join(", ")));
    }

    parts.join("\n")
}

fn excerpt(text: &str) -> String {
    truncate_message_text(text.trim(), FALLBACK_EXCERPT_CHARS)
}

/// Split an assembled digest back into its `[Role]: text` fragments.
///
/// Fragments were joined with blank lines; a blank-line boundary starts a
/// new fragment only when the next part carries a role tag, so messages that
/// contain their own blank lines are never split mid-message.
pub fn split_fragments(digest: &str) -> Vec<String> {
    let mut fragments: Vec<String> = Vec::new();
    let mut current = String::new();
    for part in digest.split("\n\n") {
        let starts_fragment = part.starts_with('[') && part.contains("]: ");
        if starts_fragment && !current.is_empty() {
            fragments.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(part);
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

/// Pack fragments into sequential chunks of at most `chunk_max_chars`
/// characters (a single oversized fragment becomes its own chunk), then
/// merge adjacent chunks until at most `max_chunks` remain.
pub fn chunk_fragments(
    fragments: &[String],
    chunk_max_chars: usize,
    max_chunks: usize,
) -> Vec<String> {
    if chunk_max_chars == 0 {
        return vec![fragments.join("\n\n")];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for fragment in fragments {
        let joined_len = if current.is_empty() {
            fragment.chars().count()
        } else {
            current.chars().count() + 2 + fragment.chars().count()
        };
        if !current.is_empty() && joined_len > chunk_max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(fragment);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    while chunks.len() > max_chunks.max(1) {
        let mut best = 0;
        let mut best_len = usize::MAX;
        for i in 0..chunks.len() - 1 {
            let len = chunks[i].chars().count() + chunks[i + 1].chars().count();
            if len < best_len {
                best_len = len;
                best = i;
            }
        }
        let merged = format!("{}\n\n{}", chunks[best], chunks[best + 1]);
        chunks[best] = merged;
        chunks.remove(best + 1);
    }

    chunks
}

/// Trim trailing whitespace per line and collapse the text into the
/// requested structural shape without rewording it.
pub fn normalize_summary(text: &str, shape: SummaryShape) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    match shape {
        SummaryShape::Prose => {
            let mut out: Vec<&str> = Vec::new();
            let mut blank_run = 0usize;
            for line in lines {
                if line.is_empty() {
                    blank_run += 1;
                    if blank_run > 1 || out.is_empty() {
                        continue;
                    }
                } else {
                    blank_run = 0;
                }
                out.push(line);
            }
            while out.last() == Some(&"") {
                out.pop();
            }
            out.join("\n")
        }
        SummaryShape::Bullets(max) => lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .take(max)
            .map(|l| {
                let stripped = l
                    .trim_start()
                    .trim_start_matches("- ")
                    .trim_start_matches("* ");
                format!("- {}", stripped)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
