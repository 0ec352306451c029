//! Streaming accumulator for one physical log unit.
//!
//! Extractors classify records and feed them in original order; the
//! accumulator owns every aggregation rule that is shared across sources:
//! the day-window gate, activity timestamps, capped-gap duration, title
//! inference, digest assembly, and the final `Session` construction. It is a
//! local mutable aggregate confined to one extraction call and never escapes
//! the extractor.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Local};
use serde_json::Value;

use super::fields;
use super::window::DayWindow;
use crate::session::digest::{self, DigestOptions};
use crate::session::{Session, SourceKind};
use crate::usage::{estimate_cost, sum_tokens, TokenUsage};

/// Per-gap cap applied when summing activity gaps into a duration.
const GAP_CAP_MS: i64 = 5 * 60 * 1000;

/// Title length cap in characters.
const TITLE_MAX_CHARS: usize = 60;

/// Substrings that mark a user message as an injected system/environment
/// envelope rather than something the user typed.
const ENVELOPE_MARKERS: &[&str] = &[
    "<system-reminder",
    "<command-name>",
    "<local-command",
    "<user-prompt-submit-hook",
    "<user_instructions",
    "<environment_context",
    "Caveat: the messages below",
    "[Request interrupted",
];

pub struct SessionAccumulator<'a> {
    tool: SourceKind,
    window: &'a DayWindow,
    opts: &'a DigestOptions,

    id: Option<String>,
    project_path: Option<String>,
    title: Option<String>,
    summary: Option<String>,

    fragments: Vec<String>,
    activity: Vec<DateTime<Local>>,
    span_min: Option<DateTime<Local>>,
    span_max: Option<DateTime<Local>>,

    user_messages: usize,
    assistant_messages: usize,

    usages: Vec<TokenUsage>,
    models: Vec<String>,
    files_touched: BTreeSet<String>,
    tool_summaries: Vec<String>,
    seen_tool_summaries: HashSet<String>,
}

impl<'a> SessionAccumulator<'a> {
    pub fn new(tool: SourceKind, window: &'a DayWindow, opts: &'a DigestOptions) -> Self {
        SessionAccumulator {
            tool,
            window,
            opts,
            id: None,
            project_path: None,
            title: None,
            summary: None,
            fragments: Vec::new(),
            activity: Vec::new(),
            span_min: None,
            span_max: None,
            user_messages: 0,
            assistant_messages: 0,
            usages: Vec::new(),
            models: Vec::new(),
            files_touched: BTreeSet::new(),
            tool_summaries: Vec::new(),
            seen_tool_summaries: HashSet::new(),
        }
    }

    /// Session identity; applied unconditionally, even outside the day
    /// window.
    pub fn set_id(&mut self, id: &str) {
        if !id.trim().is_empty() {
            self.id = Some(id.trim().to_string());
        }
    }

    /// Working-directory metadata; applied unconditionally.
    pub fn set_project_path(&mut self, path: &str) {
        if !path.trim().is_empty() {
            self.project_path = Some(path.trim().to_string());
        }
    }

    /// Source-native summary; applied unconditionally.
    pub fn set_summary(&mut self, summary: &str) {
        if !summary.trim().is_empty() {
            self.summary = Some(summary.trim().to_string());
        }
    }

    /// Track the observed timestamp span regardless of the day window.
    pub fn observe_timestamp(&mut self, ts: DateTime<Local>) {
        self.span_min = Some(match self.span_min {
            Some(cur) => cur.min(ts),
            None => ts,
        });
        self.span_max = Some(match self.span_max {
            Some(cur) => cur.max(ts),
            None => ts,
        });
    }

    fn in_day(&self, ts: Option<DateTime<Local>>) -> Option<DateTime<Local>> {
        let ts = ts?;
        self.window.contains(&ts).then_some(ts)
    }

    pub fn record_user_message(&mut self, ts: Option<DateTime<Local>>, text: &str) {
        if let Some(ts) = ts {
            self.observe_timestamp(ts);
        }
        let Some(ts) = self.in_day(ts) else { return };
        if text.trim().is_empty() {
            return;
        }
        self.activity.push(ts);
        self.user_messages += 1;
        self.push_fragment("User", text);
        self.infer_title(text);
    }

    pub fn record_assistant_message(&mut self, ts: Option<DateTime<Local>>, text: &str) {
        if let Some(ts) = ts {
            self.observe_timestamp(ts);
        }
        let Some(ts) = self.in_day(ts) else { return };
        if text.trim().is_empty() {
            return;
        }
        self.activity.push(ts);
        self.assistant_messages += 1;
        self.push_fragment("Assistant", text);
    }

    /// A tool invocation (start or result). `args` drives the summary line;
    /// paths are harvested from both `args` and `result`.
    pub fn record_tool_call(
        &mut self,
        ts: Option<DateTime<Local>>,
        name: &str,
        args: &Value,
        result: Option<&Value>,
    ) {
        if let Some(ts) = ts {
            self.observe_timestamp(ts);
        }
        let Some(ts) = self.in_day(ts) else { return };
        self.activity.push(ts);

        let line = fields::summarize_tool_call(name, args);
        if self.seen_tool_summaries.insert(line.clone()) {
            self.tool_summaries.push(line);
        }
        fields::harvest_file_paths(args, &mut self.files_touched);
        if let Some(result) = result {
            fields::harvest_file_paths(result, &mut self.files_touched);
        }
    }

    /// A bare tool result (no invocation name attached): contributes paths
    /// and an activity timestamp, but no summary line.
    pub fn record_tool_result(&mut self, ts: Option<DateTime<Local>>, payload: &Value) {
        if let Some(ts) = ts {
            self.observe_timestamp(ts);
        }
        let Some(ts) = self.in_day(ts) else { return };
        self.activity.push(ts);
        fields::harvest_file_paths(payload, &mut self.files_touched);
    }

    /// A model/turn-context record: contributes the model and a turn
    /// boundary timestamp when in-day.
    pub fn record_model(&mut self, ts: Option<DateTime<Local>>, model: &str) {
        if let Some(ts) = ts {
            self.observe_timestamp(ts);
        }
        if self.in_day(ts).is_none() {
            return;
        }
        if let Some(ts) = ts {
            self.activity.push(ts);
        }
        let model = model.trim();
        if !model.is_empty() && !self.models.iter().any(|m| m == model) {
            self.models.push(model.to_string());
        }
    }

    /// A token-usage report, merged via the alias-table search.
    pub fn record_usage(&mut self, ts: Option<DateTime<Local>>, record: &Value) {
        if let Some(ts) = ts {
            self.observe_timestamp(ts);
        }
        if self.in_day(ts).is_none() {
            return;
        }
        let usage = fields::extract_token_usage(record);
        if !usage.is_empty() {
            self.usages.push(usage);
        }
    }

    fn push_fragment(&mut self, role: &str, text: &str) {
        let capped = digest::truncate_message_text(text.trim(), self.opts.message_max_chars);
        self.fragments.push(digest::format_fragment(role, &capped));
    }

    fn infer_title(&mut self, text: &str) {
        if self.title.is_some() {
            return;
        }
        let trimmed = text.trim();
        if ENVELOPE_MARKERS.iter().any(|m| trimmed.contains(m)) {
            return;
        }
        let first_line = trimmed.lines().next().unwrap_or("");
        let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return;
        }
        self.title = Some(collapsed.chars().take(TITLE_MAX_CHARS).collect());
    }

    /// Close the unit. Returns `None` when no activity fell inside the
    /// requested day.
    pub fn finish(mut self, fallback_id: &str) -> Option<Session> {
        if self.activity.is_empty() {
            return None;
        }

        // Activity order on disk is not trusted for duration math.
        self.activity.sort_unstable();
        let duration_ms = capped_gap_duration_ms(&self.activity);

        let (Some(&first_activity), Some(&last_activity)) =
            (self.activity.first(), self.activity.last())
        else {
            return None;
        };
        let started_at = self.window.clip(self.span_min.unwrap_or(first_activity));
        let ended_at = self.window.clip(self.span_max.unwrap_or(last_activity));

        let tokens = sum_tokens(&self.usages);
        let cost_usd = match self.models.first() {
            Some(model) if !tokens.is_empty() => estimate_cost(model, &tokens),
            _ => 0.0,
        };

        let id = self
            .id
            .unwrap_or_else(|| fallback_id.to_string());
        let project_name = self.project_path.as_ref().and_then(|p| {
            std::path::Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        });

        Some(Session {
            id,
            tool: self.tool,
            project_path: self.project_path,
            project_name,
            title: self.title,
            started_at,
            ended_at,
            duration_ms,
            message_count: self.user_messages + self.assistant_messages,
            user_message_count: self.user_messages,
            assistant_message_count: self.assistant_messages,
            summary: self.summary,
            tokens,
            cost_usd,
            models: self.models,
            files_touched: self.files_touched.into_iter().collect(),
            conversation_digest: digest::build_digest(&self.fragments, self.opts),
            tool_call_summaries: self.tool_summaries,
        })
    }
}

/// Sum positive gaps between consecutive sorted timestamps, each capped at
/// five minutes, so sources that record long idle stretches or out-of-order
/// clocks cannot inflate a session.
fn capped_gap_duration_ms(sorted: &[DateTime<Local>]) -> i64 {
    sorted
        .windows(2)
        .map(|pair| {
            let gap = (pair[1] - pair[0]).num_milliseconds();
            if gap > 0 {
                gap.min(GAP_CAP_MS)
            } else {
                0
            }
        })
        .sum()
}
