//! Claude Code session extractor.
//!
//! Claude Code appends one JSONL file per conversation under
//! `~/.claude/projects/<munged-project-dir>/<session-uuid>.jsonl`. Each line
//! is one event record discriminated by `type`: `summary` rows carry a
//! source-native summary, `user`/`assistant` rows carry a `message` whose
//! `content` is either a plain string or an array of typed blocks
//! (`text`, `tool_use`, `tool_result`).

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::accum::SessionAccumulator;
use super::window::{parse_timestamp, DayWindow};
use super::{collect_files_with_extension, SessionSource};
use crate::session::digest::DigestOptions;
use crate::session::{Session, SourceKind};

pub struct ClaudeCodeSource {
    root: PathBuf,
}

impl ClaudeCodeSource {
    pub fn new() -> Self {
        let root = dirs::home_dir()
            .map(|home| home.join(".claude").join("projects"))
            .unwrap_or_default();
        ClaudeCodeSource { root }
    }

    pub fn with_root(root: PathBuf) -> Self {
        ClaudeCodeSource { root }
    }

    fn parse_unit(&self, path: &Path, window: &DayWindow, opts: &DigestOptions) -> Option<Session> {
        let file = std::fs::File::open(path).ok()?;
        let reader = BufReader::new(file);
        let mut acc = SessionAccumulator::new(SourceKind::ClaudeCode, window, opts);

        for line in reader.lines() {
            let Ok(line) = line else { continue };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Ok(record) = serde_json::from_str::<Value>(trimmed) else {
                continue;
            };
            ingest_record(&mut acc, &record);
        }

        let fallback_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        acc.finish(&fallback_id)
    }
}

impl Default for ClaudeCodeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSource for ClaudeCodeSource {
    fn name(&self) -> &'static str {
        "claude-code"
    }

    fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    fn sessions(&self, window: &DayWindow, opts: &DigestOptions) -> Vec<Session> {
        if !self.is_available() {
            return Vec::new();
        }
        collect_files_with_extension(&self.root, "jsonl")
            .iter()
            .filter_map(|path| self.parse_unit(path, window, opts))
            .collect()
    }
}

fn ingest_record(acc: &mut SessionAccumulator<'_>, record: &Value) {
    // Identity metadata applies regardless of record type or day window.
    if let Some(id) = record.get("sessionId").and_then(Value::as_str) {
        acc.set_id(id);
    }
    if let Some(cwd) = record.get("cwd").and_then(Value::as_str) {
        acc.set_project_path(cwd);
    }

    let ts = record.get("timestamp").and_then(parse_timestamp);

    match record.get("type").and_then(Value::as_str) {
        Some("summary") => {
            if let Some(summary) = record.get("summary").and_then(Value::as_str) {
                acc.set_summary(summary);
            }
        }
        Some("user") => {
            let Some(message) = record.get("message") else {
                return;
            };
            for block in tool_result_blocks(message) {
                acc.record_tool_result(ts, block);
            }
            let text = message_text(message);
            acc.record_user_message(ts, &text);
        }
        Some("assistant") => {
            let Some(message) = record.get("message") else {
                return;
            };
            if let Some(model) = message.get("model").and_then(Value::as_str) {
                acc.record_model(ts, model);
            }
            if let Some(usage) = message.get("usage") {
                acc.record_usage(ts, usage);
            }
            for block in content_blocks(message) {
                if block.get("type").and_then(Value::as_str) == Some("tool_use") {
                    let name = block.get("name").and_then(Value::as_str).unwrap_or("tool");
                    let args = block.get("input").cloned().unwrap_or(Value::Null);
                    acc.record_tool_call(ts, name, &args, None);
                }
            }
            let text = message_text(message);
            acc.record_assistant_message(ts, &text);
        }
        _ => {}
    }
}

fn content_blocks(message: &Value) -> impl Iterator<Item = &Value> {
    message
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter())
        .unwrap_or_default()
}

fn tool_result_blocks(message: &Value) -> Vec<&Value> {
    content_blocks(message)
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("tool_result"))
        .collect()
}

/// Message text: a plain string, or the joined `text` blocks of a content
/// array.
fn message_text(message: &Value) -> String {
    match message.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
