//! Cursor session extractor.
//!
//! Cursor keeps its chat history in an embedded SQLite database
//! (`…/Cursor/User/globalStorage/state.vscdb`). The `cursorDiskKV` table
//! holds one row per conversation under keys shaped `composerData:<uuid>`;
//! each row's value is a JSON document with a bubble list (`type` 1 = user,
//! 2 = assistant), per-bubble timing info and token counts, and tool call
//! payloads under `toolFormerData`.

use std::path::PathBuf;

use rusqlite::{Connection, OpenFlags};
use serde_json::Value;

use super::accum::SessionAccumulator;
use super::fields;
use super::window::{parse_timestamp, DayWindow};
use super::SessionSource;
use crate::session::digest::DigestOptions;
use crate::session::{Session, SourceKind};

const COMPOSER_KEY_PREFIX: &str = "composerData:";

pub struct CursorSource {
    db_path: PathBuf,
}

impl CursorSource {
    pub fn new() -> Self {
        let db_path = dirs::config_dir()
            .map(|config| {
                config
                    .join("Cursor")
                    .join("User")
                    .join("globalStorage")
                    .join("state.vscdb")
            })
            .unwrap_or_default();
        CursorSource { db_path }
    }

    pub fn with_db_path(db_path: PathBuf) -> Self {
        CursorSource { db_path }
    }

    fn load_composer_rows(&self) -> Vec<(String, Value)> {
        match self.try_load_composer_rows() {
            Ok(rows) => rows,
            Err(_) => Vec::new(),
        }
    }

    fn try_load_composer_rows(&self) -> rusqlite::Result<Vec<(String, Value)>> {
        let conn = Connection::open_with_flags(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare("SELECT key, value FROM cursorDiskKV WHERE key LIKE ?1")?;
        let pattern = format!("{}%", COMPOSER_KEY_PREFIX);

        let mut rows = Vec::new();
        let mut query = stmt.query([pattern])?;
        while let Some(row) = query.next()? {
            let key: String = row.get(0)?;
            // Values are TEXT in current installs but BLOB in older ones.
            let raw: rusqlite::types::Value = row.get(1)?;
            let text = match raw {
                rusqlite::types::Value::Text(t) => t,
                rusqlite::types::Value::Blob(b) => String::from_utf8_lossy(&b).to_string(),
                _ => continue,
            };
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                rows.push((key, value));
            }
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rows)
    }

    fn parse_unit(
        &self,
        key: &str,
        composer: &Value,
        window: &DayWindow,
        opts: &DigestOptions,
    ) -> Option<Session> {
        let mut acc = SessionAccumulator::new(SourceKind::Cursor, window, opts);

        if let Some(id) = composer.get("composerId").and_then(Value::as_str) {
            acc.set_id(id);
        }
        for path_key in ["cwd", "workspaceRootPath", "rootPath", "projectPath"] {
            if let Some(path) = composer.get(path_key).and_then(Value::as_str) {
                acc.set_project_path(path);
                break;
            }
        }

        let composer_ts = composer
            .get("createdAt")
            .and_then(parse_timestamp)
            .or_else(|| composer.get("lastUpdatedAt").and_then(parse_timestamp));

        if let Some(bubbles) = composer.get("conversation").and_then(Value::as_array) {
            for bubble in bubbles {
                ingest_bubble(&mut acc, bubble, composer_ts);
            }
        }

        let fallback_id = key.strip_prefix(COMPOSER_KEY_PREFIX).unwrap_or(key);
        acc.finish(fallback_id)
    }
}

impl Default for CursorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSource for CursorSource {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn is_available(&self) -> bool {
        self.db_path.is_file()
    }

    fn sessions(&self, window: &DayWindow, opts: &DigestOptions) -> Vec<Session> {
        if !self.is_available() {
            return Vec::new();
        }
        self.load_composer_rows()
            .iter()
            .filter_map(|(key, composer)| self.parse_unit(key, composer, window, opts))
            .collect()
    }
}

fn ingest_bubble(
    acc: &mut SessionAccumulator<'_>,
    bubble: &Value,
    composer_ts: Option<chrono::DateTime<chrono::Local>>,
) {
    let ts = bubble
        .get("timingInfo")
        .and_then(|t| t.get("clientStartTime"))
        .and_then(parse_timestamp)
        .or_else(|| bubble.get("createdAt").and_then(parse_timestamp))
        .or(composer_ts);

    if let Some(model) = fields::harvest_model(bubble) {
        acc.record_model(ts, &model);
    }
    if bubble.get("tokenCount").is_some() {
        acc.record_usage(ts, bubble);
    }
    if let Some(tool) = bubble.get("toolFormerData") {
        let name = tool
            .get("name")
            .or_else(|| tool.get("tool"))
            .and_then(Value::as_str)
            .unwrap_or("tool");
        let args = decode_params(tool.get("params").or_else(|| tool.get("rawArgs")));
        acc.record_tool_call(ts, name, &args, tool.get("result"));
    }

    let text = bubble.get("text").and_then(Value::as_str).unwrap_or("");
    match bubble.get("type").and_then(Value::as_u64) {
        Some(1) => acc.record_user_message(ts, text),
        Some(2) => acc.record_assistant_message(ts, text),
        _ => {}
    }
}

/// Tool params may be an object or a JSON-encoded string.
fn decode_params(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}
