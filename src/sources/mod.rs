pub mod accum;
pub mod claude_code;
pub mod codex;
pub mod cursor;
pub mod fields;
pub mod gemini;
pub mod window;

use std::path::{Path, PathBuf};

pub use window::DayWindow;

use crate::session::digest::DigestOptions;
use crate::session::Session;

/// One log-format extractor.
///
/// Implementations are read-only and tolerant: a malformed record is
/// skipped, an unreadable unit contributes nothing, a missing root path
/// yields an empty list. Given immutable input the result is deterministic.
pub trait SessionSource {
    /// Stable identifier used in output and diagnostics.
    fn name(&self) -> &'static str;

    /// True iff the source's expected root path exists. Never errors.
    fn is_available(&self) -> bool;

    /// All sessions with activity inside the requested day.
    fn sessions(&self, window: &DayWindow, opts: &DigestOptions) -> Vec<Session>;
}

/// Every known source, in registration order. Recap assembly collects
/// sessions in this order; no cross-source ordering beyond it is promised.
pub fn all_sources() -> Vec<Box<dyn SessionSource>> {
    vec![
        Box::new(claude_code::ClaudeCodeSource::new()),
        Box::new(codex::CodexSource::new()),
        Box::new(cursor::CursorSource::new()),
        Box::new(gemini::GeminiSource::new()),
    ]
}

/// Recursively collect files with the given extension, sorted for
/// deterministic unit order.
pub(crate) fn collect_files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(dir, extension, &mut files);
    files.sort();
    files
}

fn walk(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, extension, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            out.push(path);
        }
    }
}
