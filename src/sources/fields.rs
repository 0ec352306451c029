//! Resilient field lookup over heterogeneous source records.
//!
//! Every source labels the same semantic data differently. Rather than
//! branching per source, lookups here are driven by strategy tables: an
//! ordered alias list per semantic bucket, plus a bounded recursive search
//! through known nested container keys. Supporting a new source means adding
//! table rows, not control flow.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::usage::TokenUsage;

/// Container keys worth descending into when an alias is not found at the
/// current level.
const NESTED_CONTAINER_KEYS: &[&str] = &[
    "usage",
    "info",
    "last_token_usage",
    "tokens",
    "tokenCount",
    "usageMetadata",
    "metrics",
    "result",
];

/// Maximum nesting depth for the alias search.
const MAX_SEARCH_DEPTH: usize = 3;

const INPUT_ALIASES: &[&str] = &[
    "input_tokens",
    "inputTokens",
    "prompt_tokens",
    "promptTokenCount",
    "input",
];

const OUTPUT_ALIASES: &[&str] = &[
    "output_tokens",
    "outputTokens",
    "completion_tokens",
    "candidatesTokenCount",
    "output",
];

const REASONING_ALIASES: &[&str] = &[
    "reasoning_output_tokens",
    "reasoning_tokens",
    "thoughtsTokenCount",
    "thoughts_tokens",
    "thoughts",
    "reasoning",
];

const CACHE_READ_ALIASES: &[&str] = &[
    "cache_read_input_tokens",
    "cached_input_tokens",
    "cachedContentTokenCount",
    "cache_read_tokens",
    "cached",
];

const CACHE_WRITE_ALIASES: &[&str] = &[
    "cache_creation_input_tokens",
    "cache_write_tokens",
    "cacheWriteTokens",
    "cache_creation",
];

const MODEL_ALIASES: &[&str] = &["model", "modelId", "model_id", "modelName", "model_name"];

/// Containers that may hold a model identifier one level down.
const MODEL_CONTAINER_KEYS: &[&str] = &["message", "payload", "info", "metadata"];

const COMMAND_ALIASES: &[&str] = &["command", "cmd", "script"];

const PATTERN_ALIASES: &[&str] = &["pattern", "query", "glob", "q"];

/// Extract token buckets from a usage-bearing record.
///
/// For each bucket the ordered aliases are tried at the current object, then
/// the search descends into known container keys up to depth 3. First match
/// per bucket wins; unmatched buckets are 0. `total` is recomputed from the
/// buckets rather than trusted from the record.
pub fn extract_token_usage(value: &Value) -> TokenUsage {
    TokenUsage::from_buckets(
        find_count(value, INPUT_ALIASES, MAX_SEARCH_DEPTH).unwrap_or(0),
        find_count(value, OUTPUT_ALIASES, MAX_SEARCH_DEPTH).unwrap_or(0),
        find_count(value, REASONING_ALIASES, MAX_SEARCH_DEPTH).unwrap_or(0),
        find_count(value, CACHE_READ_ALIASES, MAX_SEARCH_DEPTH).unwrap_or(0),
        find_count(value, CACHE_WRITE_ALIASES, MAX_SEARCH_DEPTH).unwrap_or(0),
    )
}

fn find_count(value: &Value, aliases: &[&str], depth: usize) -> Option<u64> {
    let obj = value.as_object()?;
    for key in aliases {
        if let Some(n) = obj.get(*key).and_then(value_as_count) {
            return Some(n);
        }
    }
    if depth == 0 {
        return None;
    }
    for container in NESTED_CONTAINER_KEYS {
        if let Some(nested) = obj.get(*container) {
            if let Some(n) = find_count(nested, aliases, depth - 1) {
                return Some(n);
            }
        }
    }
    None
}

fn value_as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

/// Find a model identifier on a record, checking aliases at the current
/// level and one set of known containers below it.
pub fn harvest_model(value: &Value) -> Option<String> {
    find_string(value, MODEL_ALIASES, MODEL_CONTAINER_KEYS, 2)
}

fn find_string(
    value: &Value,
    aliases: &[&str],
    containers: &[&str],
    depth: usize,
) -> Option<String> {
    let obj = value.as_object()?;
    for key in aliases {
        if let Some(s) = obj.get(*key).and_then(Value::as_str) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    if depth == 0 {
        return None;
    }
    for container in containers {
        if let Some(nested) = obj.get(*container) {
            if let Some(s) = find_string(nested, aliases, containers, depth - 1) {
                return Some(s);
            }
        }
    }
    None
}

/// Recursively collect filesystem paths from tool invocation arguments or
/// results.
///
/// A string qualifies when its key looks path-like (contains "path" or
/// "file", or is exactly "cwd") and its value looks like a filesystem path
/// (has a separator or a `~`/`./`/`../` prefix) and is not a URL.
pub fn harvest_file_paths(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                if let Value::String(s) = val {
                    if is_path_like_key(key) && is_path_like_value(s) {
                        out.insert(s.trim().to_string());
                    }
                } else {
                    harvest_file_paths(val, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                harvest_file_paths(item, out);
            }
        }
        _ => {}
    }
}

fn is_path_like_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    lower == "cwd" || lower.contains("path") || lower.contains("file")
}

fn is_path_like_value(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_url(trimmed) {
        return false;
    }
    trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.starts_with('~')
        || trimmed.starts_with("./")
        || trimmed.starts_with("../")
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.contains("://")
}

/// Maximum command length carried into a tool-call summary line.
const COMMAND_SUMMARY_CHARS: usize = 80;

/// Render a tool invocation as one short human-readable line.
///
/// Preference order: a discovered file path argument, then a command string,
/// then a search pattern, then the bare tool name.
pub fn summarize_tool_call(tool: &str, args: &Value) -> String {
    let mut paths = BTreeSet::new();
    harvest_file_paths(args, &mut paths);
    if let Some(path) = paths.into_iter().next() {
        return format!("{} {}", tool, path);
    }

    if let Some(command) = find_string(args, COMMAND_ALIASES, &[], 0) {
        let mut compact = command.split_whitespace().collect::<Vec<_>>().join(" ");
        if compact.chars().count() > COMMAND_SUMMARY_CHARS {
            compact = compact.chars().take(COMMAND_SUMMARY_CHARS).collect();
        }
        return format!("bash: {}", compact);
    }

    if let Some(pattern) = find_string(args, PATTERN_ALIASES, &[], 0) {
        return format!("{}: {}", tool, pattern);
    }

    tool.to_string()
}
