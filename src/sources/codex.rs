//! Codex CLI session extractor.
//!
//! Codex writes one JSONL rollout file per session under
//! `~/.codex/sessions/`, organized into dated subdirectories. Records carry
//! an outer `type` and a `payload`: `session_meta` (identity), `turn_context`
//! (model per turn), `event_msg` (user/agent messages and `token_count`
//! reports under `info.last_token_usage`), and `response_item` rows whose
//! `function_call` payloads hold JSON-encoded argument strings.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::accum::SessionAccumulator;
use super::window::{parse_timestamp, DayWindow};
use super::{collect_files_with_extension, SessionSource};
use crate::session::digest::DigestOptions;
use crate::session::{Session, SourceKind};

pub struct CodexSource {
    root: PathBuf,
}

impl CodexSource {
    pub fn new() -> Self {
        let root = std::env::var("CODEX_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|home| home.join(".codex")))
            .map(|home| home.join("sessions"))
            .unwrap_or_default();
        CodexSource { root }
    }

    pub fn with_root(root: PathBuf) -> Self {
        CodexSource { root }
    }

    fn parse_unit(&self, path: &Path, window: &DayWindow, opts: &DigestOptions) -> Option<Session> {
        let file = std::fs::File::open(path).ok()?;
        let reader = BufReader::new(file);
        let mut acc = SessionAccumulator::new(SourceKind::Codex, window, opts);

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

impl Default for CodexSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSource for CodexSource {
    fn name(&self) -> &'static str {
        "codex"
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
    let ts = record.get("timestamp").and_then(parse_timestamp);
    let Some(payload) = record.get("payload") else {
        return;
    };

    match record.get("type").and_then(Value::as_str) {
        Some("session_meta") => {
            if let Some(id) = payload.get("id").and_then(Value::as_str) {
                acc.set_id(id);
            }
            if let Some(cwd) = payload.get("cwd").and_then(Value::as_str) {
                acc.set_project_path(cwd);
            }
        }
        Some("turn_context") => {
            if let Some(cwd) = payload.get("cwd").and_then(Value::as_str) {
                acc.set_project_path(cwd);
            }
            if let Some(model) = payload.get("model").and_then(Value::as_str) {
                acc.record_model(ts, model);
            }
        }
        Some("event_msg") => match payload.get("type").and_then(Value::as_str) {
            Some("user_message") => {
                if let Some(text) = payload.get("message").and_then(Value::as_str) {
                    acc.record_user_message(ts, text);
                }
            }
            Some("agent_message") => {
                if let Some(text) = payload.get("message").and_then(Value::as_str) {
                    acc.record_assistant_message(ts, text);
                }
            }
            Some("token_count") => {
                acc.record_usage(ts, payload);
            }
            _ => {}
        },
        Some("response_item") => {
            if payload.get("type").and_then(Value::as_str) == Some("function_call") {
                let name = payload.get("name").and_then(Value::as_str).unwrap_or("tool");
                let args = decode_arguments(payload.get("arguments"));
                acc.record_tool_call(ts, name, &args, None);
            }
        }
        _ => {}
    }
}

/// `function_call` arguments arrive as a JSON-encoded string.
fn decode_arguments(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> DayWindow {
        DayWindow::for_date("2026-02-05").unwrap()
    }

    fn iso(window: &DayWindow, secs: i64) -> String {
        (window.start + chrono::Duration::seconds(secs)).to_rfc3339()
    }

    fn write_rollout(root: &Path, rel: &str, lines: &[String]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, lines.join("\n")).unwrap();
    }

    #[test]
    fn test_rollout_aggregation() {
        let dir = tempfile::tempdir().unwrap();
        let w = window();
        write_rollout(
            dir.path(),
            "2026/02/05/rollout-2026-02-05T09-00-00-abc.jsonl",
            &[
                format!(
                    r#"{{"timestamp":"{}","type":"session_meta","payload":{{"id":"0199a213-collab","cwd":"/home/user/api"}}}}"#,
                    iso(&w, 0)
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"turn_context","payload":{{"model":"gpt-5-codex"}}}}"#,
                    iso(&w, 5)
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"user_message","message":"tighten the rate limiter"}}}}"#,
                    iso(&w, 10)
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"response_item","payload":{{"type":"function_call","name":"shell","arguments":"{{\"command\":\"cargo test -p api\"}}"}}}}"#,
                    iso(&w, 20)
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"agent_message","message":"lowered the burst window to 10s"}}}}"#,
                    iso(&w, 30)
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"token_count","info":{{"last_token_usage":{{"input_tokens":1200,"cached_input_tokens":200,"output_tokens":500,"reasoning_output_tokens":40,"total_tokens":1940}}}}}}}}"#,
                    iso(&w, 31)
                ),
            ],
        );

        let source = CodexSource::with_root(dir.path().to_path_buf());
        assert!(source.is_available());
        let sessions = source.sessions(&w, &DigestOptions::default());
        assert_eq!(sessions.len(), 1);

        let s = &sessions[0];
        assert_eq!(s.id, "0199a213-collab");
        assert_eq!(s.project_name.as_deref(), Some("api"));
        assert_eq!(s.models, vec!["gpt-5-codex"]);
        assert_eq!(s.user_message_count, 1);
        assert_eq!(s.assistant_message_count, 1);
        assert_eq!(s.tokens.input, 1200);
        assert_eq!(s.tokens.cache_read, 200);
        assert_eq!(s.tokens.output, 500);
        assert_eq!(s.tokens.reasoning, 40);
        assert_eq!(s.tool_call_summaries, vec!["bash: cargo test -p api"]);
        assert_eq!(s.title.as_deref(), Some("tighten the rate limiter"));
    }

    #[test]
    fn test_rollout_spanning_midnight_is_clipped() {
        let dir = tempfile::tempdir().unwrap();
        let w = window();
        write_rollout(
            dir.path(),
            "2026/02/04/rollout-late.jsonl",
            &[
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"user_message","message":"late night question"}}}}"#,
                    (w.start - chrono::Duration::minutes(30)).to_rfc3339()
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"agent_message","message":"answered after midnight"}}}}"#,
                    iso(&w, 600)
                ),
            ],
        );

        let source = CodexSource::with_root(dir.path().to_path_buf());
        let sessions = source.sessions(&w, &DigestOptions::default());
        assert_eq!(sessions.len(), 1);
        let s = &sessions[0];
        // Only the in-day half is aggregated; the span clips to day start.
        assert_eq!(s.message_count, 1);
        assert_eq!(s.started_at, w.start);
        assert!(s.conversation_digest.contains("answered after midnight"));
        assert!(!s.conversation_digest.contains("late night question"));
    }

    #[test]
    fn test_token_count_without_last_usage_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let w = window();
        write_rollout(
            dir.path(),
            "2026/02/05/rollout-totals-only.jsonl",
            &[
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"user_message","message":"hi"}}}}"#,
                    iso(&w, 0)
                ),
                format!(
                    r#"{{"timestamp":"{}","type":"event_msg","payload":{{"type":"token_count","info":{{"total_token_usage":{{"input_tokens":9999}}}}}}}}"#,
                    iso(&w, 5)
                ),
            ],
        );

        let source = CodexSource::with_root(dir.path().to_path_buf());
        let sessions = source.sessions(&w, &DigestOptions::default());
        // Cumulative totals are not per-event deltas; they are skipped.
        assert!(sessions[0].tokens.is_empty());
    }
}
