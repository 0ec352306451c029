//! Conversation digest assembly and size bounding.
//!
//! A digest is the human-readable transcript of one session: ordered
//! `[Role]: text` fragments joined with blank lines. Two caps apply, both
//! character-based: one per message fragment, one on the assembled digest.
//! Truncating the assembled digest keeps head and tail context around a
//! literal omission marker.

use std::env;

pub const DEFAULT_MESSAGE_MAX_CHARS: usize = 500;
pub const DEFAULT_DIGEST_MAX_CHARS: usize = 8000;

/// Literal marker inserted where digest content was cut out.
pub const TRUNCATION_MARKER: &str = "\n\n[... conversation truncated ...]\n\n";

/// Fraction (percent) of the remaining budget given to the head slice.
const HEAD_BUDGET_PERCENT: usize = 55;

const ELLIPSIS: char = '…';

/// Size caps for digest assembly, resolved once at the program boundary and
/// threaded into extractors. A cap of 0 disables that bound.
#[derive(Debug, Clone, Copy)]
pub struct DigestOptions {
    pub message_max_chars: usize,
    pub digest_max_chars: usize,
}

impl Default for DigestOptions {
    fn default() -> Self {
        DigestOptions {
            message_max_chars: DEFAULT_MESSAGE_MAX_CHARS,
            digest_max_chars: DEFAULT_DIGEST_MAX_CHARS,
        }
    }
}

impl DigestOptions {
    /// Resolve caps from `RECAP_MESSAGE_MAX_CHARS` / `RECAP_DIGEST_MAX_CHARS`.
    ///
    /// A value of `0` disables the respective cap; absent or unparsable
    /// values fall back to the built-in defaults.
    pub fn from_env() -> Self {
        DigestOptions {
            message_max_chars: parse_cap_var("RECAP_MESSAGE_MAX_CHARS")
                .unwrap_or(DEFAULT_MESSAGE_MAX_CHARS),
            digest_max_chars: parse_cap_var("RECAP_DIGEST_MAX_CHARS")
                .unwrap_or(DEFAULT_DIGEST_MAX_CHARS),
        }
    }
}

/// Parse a non-negative integer environment variable; None when unset or
/// invalid.
pub fn parse_cap_var(name: &str) -> Option<usize> {
    let raw = env::var(name).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<usize>().ok()
}

/// Cap one message's text to `max_chars` characters, appending an ellipsis
/// when cut. A cap of 0 disables the bound.
pub fn truncate_message_text(text: &str, max_chars: usize) -> String {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push(ELLIPSIS);
    out
}

/// Format one digest fragment from a role tag and (already capped) text.
pub fn format_fragment(role: &str, text: &str) -> String {
    format!("[{}]: {}", role, text)
}

/// Join fragments with a blank-line separator and bound the result.
pub fn build_digest(fragments: &[String], opts: &DigestOptions) -> String {
    let joined = fragments.join("\n\n");
    truncate_conversation_digest(&joined, opts.digest_max_chars)
}

/// Bound an assembled digest to `max_chars` characters.
///
/// A digest that already fits is returned unchanged, which makes the
/// transform idempotent. Otherwise the result is a head slice, the omission
/// marker, and a tail slice, with dangling whitespace trimmed at both cut
/// edges; the result never exceeds `max_chars`. A cap of 0 disables the
/// bound.
pub fn truncate_conversation_digest(digest: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return digest.to_string();
    }
    let total = digest.chars().count();
    if total <= max_chars {
        return digest.to_string();
    }

    let marker_chars = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_chars {
        // Budget too small to fit the marker; degrade to a plain head cut.
        return char_prefix(digest, max_chars).trim_end().to_string();
    }

    let remaining = max_chars - marker_chars;
    let head_budget = remaining * HEAD_BUDGET_PERCENT / 100;
    let tail_budget = remaining - head_budget;

    let head = char_prefix(digest, head_budget);
    let tail = char_suffix(digest, tail_budget);

    format!("{}{}{}", head.trim_end(), TRUNCATION_MARKER, tail.trim_start())
}

/// Whether a digest carries the omission marker.
pub fn is_digest_truncated(digest: &str) -> bool {
    digest.contains(TRUNCATION_MARKER)
}

fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn char_suffix(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if n >= total {
        return s;
    }
    match s.char_indices().nth(total - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_text_under_cap_unchanged() {
        assert_eq!(truncate_message_text("short", 10), "short");
    }

    #[test]
    fn test_message_text_cut_to_cap_plus_ellipsis() {
        let text = "a".repeat(40);
        let out = truncate_message_text(&text, 10);
        assert_eq!(out.chars().count(), 11);
        assert!(out.starts_with(&"a".repeat(10)));
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_message_cap_zero_disables() {
        let text = "x".repeat(1000);
        assert_eq!(truncate_message_text(&text, 0), text);
    }

    #[test]
    fn test_digest_under_cap_unchanged() {
        let digest = "[User]: hello\n\n[Assistant]: hi";
        assert_eq!(
            truncate_conversation_digest(digest, 1000),
            digest
        );
        assert!(!is_digest_truncated(digest));
    }

    #[test]
    fn test_digest_truncation_bounds_and_marker() {
        let head_text = "HEAD-".repeat(400);
        let tail_text = "-TAIL".repeat(400);
        let digest = format!("{}{}", head_text, tail_text);
        let max = 500;

        let out = truncate_conversation_digest(&digest, max);
        assert!(out.chars().count() <= max);
        assert!(out.contains(TRUNCATION_MARKER));
        assert!(out.starts_with("HEAD-"));
        assert!(out.ends_with("-TAIL"));
        assert!(is_digest_truncated(&out));
    }

    #[test]
    fn test_truncation_is_idempotent() {
        let digest = "z".repeat(20_000);
        let once = truncate_conversation_digest(&digest, 8000);
        let twice = truncate_conversation_digest(&once, 8000);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cap_zero_disables_digest_bound() {
        let digest = "z".repeat(20_000);
        assert_eq!(truncate_conversation_digest(&digest, 0), digest);
    }

    #[test]
    fn test_no_false_negative_on_truncated_text() {
        let digest = "w".repeat(9000);
        let out = truncate_conversation_digest(&digest, 800);
        assert!(is_digest_truncated(&out));
    }

    #[test]
    fn test_tiny_budget_degrades_without_marker() {
        let digest = "q".repeat(500);
        let out = truncate_conversation_digest(&digest, 10);
        assert!(out.chars().count() <= 10);
        assert!(!is_digest_truncated(&out));
    }

    #[test]
    fn test_multibyte_safe_cuts() {
        let digest = "héllo wörld héllo wörld ".repeat(200);
        let out = truncate_conversation_digest(&digest, 300);
        assert!(out.chars().count() <= 300);
        assert!(out.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_build_digest_joins_with_blank_line() {
        let fragments = vec![
            format_fragment("User", "hello"),
            format_fragment("Assistant", "hi there"),
        ];
        let out = build_digest(&fragments, &DigestOptions::default());
        assert_eq!(out, "[User]: hello\n\n[Assistant]: hi there");
    }

    #[test]
    fn test_options_default_caps() {
        let opts = DigestOptions::default();
        assert_eq!(opts.message_max_chars, 500);
        assert_eq!(opts.digest_max_chars, 8000);
    }
}
