//! Gemini CLI session extractor.
//!
//! Gemini CLI is a hybrid source: each project-hash directory under
//! `~/.gemini/tmp/` holds structured chat files (`chats/*.json`, one per
//! session, with a `messages` array of typed entries) plus a sidecar
//! `logs.json` in the parent directory recording user prompts with
//! timestamps. Chat messages that lack their own timestamp are backfilled
//! from the sidecar by message id before falling back to the session's
//! `startTime`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde_json::Value;

use super::accum::SessionAccumulator;
use super::fields;
use super::window::{parse_timestamp, DayWindow};
use super::SessionSource;
use crate::session::digest::DigestOptions;
use crate::session::{Session, SourceKind};

pub struct GeminiSource {
    root: PathBuf,
}

/// Timestamps recovered from one directory's sidecar `logs.json`.
#[derive(Default)]
struct SidecarIndex {
    by_message_id: HashMap<String, DateTime<Local>>,
}

impl GeminiSource {
    pub fn new() -> Self {
        let root = dirs::home_dir()
            .map(|home| home.join(".gemini").join("tmp"))
            .unwrap_or_default();
        GeminiSource { root }
    }

    pub fn with_root(root: PathBuf) -> Self {
        GeminiSource { root }
    }

    fn parse_unit(
        &self,
        path: &Path,
        sidecar: &SidecarIndex,
        window: &DayWindow,
        opts: &DigestOptions,
    ) -> Option<Session> {
        let text = std::fs::read_to_string(path).ok()?;
        let chat: Value = serde_json::from_str(&text).ok()?;

        let mut acc = SessionAccumulator::new(SourceKind::Gemini, window, opts);

        if let Some(id) = chat.get("sessionId").and_then(Value::as_str) {
            acc.set_id(id);
        }
        for key in ["projectPath", "cwd", "workspaceDir"] {
            if let Some(project) = chat.get(key).and_then(Value::as_str) {
                acc.set_project_path(project);
                break;
            }
        }

        let session_start = chat.get("startTime").and_then(parse_timestamp);
        if let Some(ts) = session_start {
            acc.observe_timestamp(ts);
        }
        if let Some(ts) = chat.get("lastUpdated").and_then(parse_timestamp) {
            acc.observe_timestamp(ts);
        }

        if let Some(messages) = chat.get("messages").and_then(Value::as_array) {
            for message in messages {
                ingest_message(&mut acc, message, sidecar, session_start);
            }
        }

        let fallback_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        acc.finish(&fallback_id)
    }

    /// Chat files grouped with the sidecar of their project-hash directory.
    fn chat_units(&self) -> Vec<(PathBuf, SidecarIndex)> {
        let mut units = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return units;
        };
        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let chats_dir = dir.join("chats");
            let mut chats: Vec<PathBuf> = std::fs::read_dir(&chats_dir)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|e| e.path())
                        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
                        .collect()
                })
                .unwrap_or_default();
            chats.sort();
            for chat in chats {
                units.push((chat, load_sidecar(&dir.join("logs.json"))));
            }
        }
        units
    }
}

impl Default for GeminiSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSource for GeminiSource {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    fn sessions(&self, window: &DayWindow, opts: &DigestOptions) -> Vec<Session> {
        if !self.is_available() {
            return Vec::new();
        }
        self.chat_units()
            .iter()
            .filter_map(|(path, sidecar)| self.parse_unit(path, sidecar, window, opts))
            .collect()
    }
}

fn load_sidecar(path: &Path) -> SidecarIndex {
    let mut index = SidecarIndex::default();
    let Ok(text) = std::fs::read_to_string(path) else {
        return index;
    };
    let Ok(entries) = serde_json::from_str::<Value>(&text) else {
        return index;
    };
    let Some(entries) = entries.as_array() else {
        return index;
    };
    for entry in entries {
        let Some(ts) = entry.get("timestamp").and_then(parse_timestamp) else {
            continue;
        };
        if let Some(message_id) = entry.get("messageId").and_then(id_as_string) {
            index.by_message_id.insert(message_id, ts);
        }
    }
    index
}

/// Sidecar message ids appear as strings or integers depending on version.
fn id_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn ingest_message(
    acc: &mut SessionAccumulator<'_>,
    message: &Value,
    sidecar: &SidecarIndex,
    session_start: Option<DateTime<Local>>,
) {
    let ts = message
        .get("timestamp")
        .and_then(parse_timestamp)
        .or_else(|| {
            message
                .get("id")
                .and_then(id_as_string)
                .and_then(|id| sidecar.by_message_id.get(&id).copied())
        })
        .or(session_start);

    if let Some(model) = fields::harvest_model(message) {
        acc.record_model(ts, &model);
    }
    if message.get("tokens").is_some() {
        acc.record_usage(ts, message);
    }
    if let Some(tool_calls) = message.get("toolCalls").and_then(Value::as_array) {
        for call in tool_calls {
            let name = call.get("name").and_then(Value::as_str).unwrap_or("tool");
            let args = call.get("args").cloned().unwrap_or(Value::Null);
            acc.record_tool_call(ts, name, &args, call.get("result"));
        }
    }

    let text = message
        .get("content")
        .or_else(|| message.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("");
    match message.get("type").and_then(Value::as_str) {
        Some("user") => acc.record_user_message(ts, text),
        Some("gemini") | Some("assistant") | Some("model") => {
            acc.record_assistant_message(ts, text)
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn window() -> DayWindow {
        DayWindow::for_date("2026-02-05").unwrap()
    }

    fn iso(window: &DayWindow, secs: i64) -> String {
        (window.start + chrono::Duration::seconds(secs)).to_rfc3339()
    }

    fn write_unit(root: &Path, hash: &str, chat: &Value, logs: Option<&Value>) {
        let dir = root.join(hash);
        std::fs::create_dir_all(dir.join("chats")).unwrap();
        std::fs::write(
            dir.join("chats").join("session-1.json"),
            chat.to_string(),
        )
        .unwrap();
        if let Some(logs) = logs {
            std::fs::write(dir.join("logs.json"), logs.to_string()).unwrap();
        }
    }

    #[test]
    fn test_chat_file_with_tokens_and_tools() {
        let dir = tempfile::tempdir().unwrap();
        let w = window();
        let chat = json!({
            "sessionId": "gem-1",
            "projectPath": "/home/user/docs-site",
            "startTime": iso(&w, 0),
            "lastUpdated": iso(&w, 200),
            "messages": [
                { "id": "m1", "timestamp": iso(&w, 0), "type": "user",
                  "content": "regenerate the sitemap" },
                { "id": "m2", "timestamp": iso(&w, 60), "type": "gemini",
                  "content": "sitemap rebuilt with 42 entries",
                  "model": "gemini-2.5-pro",
                  "tokens": { "input": 500, "output": 120, "cached": 30, "thoughts": 15 },
                  "toolCalls": [
                      { "name": "write_file",
                        "args": { "file_path": "/home/user/docs-site/sitemap.xml" } }
                  ] }
            ]
        });
        write_unit(dir.path(), "abc123", &chat, None);

        let source = GeminiSource::with_root(dir.path().to_path_buf());
        assert!(source.is_available());
        let sessions = source.sessions(&w, &DigestOptions::default());
        assert_eq!(sessions.len(), 1);

        let s = &sessions[0];
        assert_eq!(s.id, "gem-1");
        assert_eq!(s.project_name.as_deref(), Some("docs-site"));
        assert_eq!(s.models, vec!["gemini-2.5-pro"]);
        assert_eq!(s.tokens.input, 500);
        assert_eq!(s.tokens.output, 120);
        assert_eq!(s.tokens.cache_read, 30);
        assert_eq!(s.tokens.reasoning, 15);
        assert_eq!(
            s.tool_call_summaries,
            vec!["write_file /home/user/docs-site/sitemap.xml"]
        );
        assert_eq!(s.title.as_deref(), Some("regenerate the sitemap"));
    }

    #[test]
    fn test_sidecar_backfills_missing_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let w = window();
        let chat = json!({
            "sessionId": "gem-2",
            "messages": [
                { "id": "m1", "type": "user", "content": "check the failing deploy" }
            ]
        });
        let logs = json!([
            { "sessionId": "gem-2", "messageId": "m1", "type": "user",
              "message": "check the failing deploy", "timestamp": iso(&w, 500) }
        ]);
        write_unit(dir.path(), "def456", &chat, Some(&logs));

        let source = GeminiSource::with_root(dir.path().to_path_buf());
        let sessions = source.sessions(&w, &DigestOptions::default());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].user_message_count, 1);
    }

    #[test]
    fn test_unit_without_any_timestamp_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let w = window();
        let chat = json!({
            "sessionId": "gem-3",
            "messages": [ { "id": "m1", "type": "user", "content": "hello" } ]
        });
        write_unit(dir.path(), "ghi789", &chat, None);

        let source = GeminiSource::with_root(dir.path().to_path_buf());
        assert!(source.sessions(&w, &DigestOptions::default()).is_empty());
    }
}
