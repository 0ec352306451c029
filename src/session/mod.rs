pub mod digest;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::usage::TokenUsage;

/// Which assistant produced a session's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    ClaudeCode,
    Codex,
    Cursor,
    Gemini,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::ClaudeCode => "claude-code",
            SourceKind::Codex => "codex",
            SourceKind::Cursor => "cursor",
            SourceKind::Gemini => "gemini",
        }
    }

    /// Display label for rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::ClaudeCode => "Claude Code",
            SourceKind::Codex => "Codex",
            SourceKind::Cursor => "Cursor",
            SourceKind::Gemini => "Gemini CLI",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized conversation from one tool, clipped to a requested day.
///
/// Built once per physical log unit by an extractor and immutable afterwards.
/// Two sessions are never merged; each represents exactly one underlying
/// conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Source-native identifier, or a derived value (file stem, row key)
    /// when the source does not record one.
    pub id: String,
    pub tool: SourceKind,
    pub project_path: Option<String>,
    pub project_name: Option<String>,
    /// Inferred from the first real user message; never overwrites a value
    /// once set.
    pub title: Option<String>,
    /// Clipped into the requested day window.
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
    /// Sum of capped gaps between consecutive activity timestamps.
    pub duration_ms: i64,
    pub message_count: usize,
    pub user_message_count: usize,
    pub assistant_message_count: usize,
    /// Source-native summary only; the summarization pipeline never writes
    /// this field.
    pub summary: Option<String>,
    pub tokens: TokenUsage,
    pub cost_usd: f64,
    /// Model identifiers in first-seen order, deduplicated.
    pub models: Vec<String>,
    /// Sorted absolute paths harvested from tool invocations.
    pub files_touched: Vec<String>,
    pub conversation_digest: String,
    /// Short human-readable tool invocation lines, deduplicated, in
    /// first-seen order.
    pub tool_call_summaries: Vec<String>,
}

impl Session {
    /// Project name for grouping: explicit name, else the last path
    /// component, else none.
    pub fn display_project(&self) -> Option<String> {
        if let Some(name) = &self.project_name {
            return Some(name.clone());
        }
        self.project_path.as_ref().and_then(|p| {
            std::path::Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Session {
        Session {
            id: "abc".into(),
            tool: SourceKind::ClaudeCode,
            project_path: Some("/home/user/projects/widget".into()),
            project_name: None,
            title: None,
            started_at: Local.with_ymd_and_hms(2026, 2, 5, 9, 0, 0).unwrap(),
            ended_at: Local.with_ymd_and_hms(2026, 2, 5, 10, 0, 0).unwrap(),
            duration_ms: 0,
            message_count: 0,
            user_message_count: 0,
            assistant_message_count: 0,
            summary: None,
            tokens: TokenUsage::default(),
            cost_usd: 0.0,
            models: vec![],
            files_touched: vec![],
            conversation_digest: String::new(),
            tool_call_summaries: vec![],
        }
    }

    #[test]
    fn test_display_project_from_path() {
        assert_eq!(sample().display_project().as_deref(), Some("widget"));
    }

    #[test]
    fn test_display_project_prefers_name() {
        let mut s = sample();
        s.project_name = Some("Widget Factory".into());
        assert_eq!(s.display_project().as_deref(), Some("Widget Factory"));
    }
}
