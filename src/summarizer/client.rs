//! External summarization call contract.
//!
//! Every request resolves to an explicit [`CallOutcome`] instead of an
//! error: timeouts, non-success statuses, malformed bodies, and network
//! failures are all uniform [`CallFailure`] reasons, and nothing here ever
//! propagates an `Err` to the pipeline. A failed call never aborts sibling
//! calls.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Hard bound on one chunk/synthesis request.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(25);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    #[error("request timed out")]
    Timeout,
    #[error("endpoint returned status {0}")]
    Status(u16),
    #[error("response body had no text content")]
    MalformedBody,
    #[error("network error: {0}")]
    Network(String),
}

/// Explicit result of one external call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Success(String),
    Failure(CallFailure),
}

impl CallOutcome {
    /// Usable text, or `None` for failures and empty responses.
    pub fn into_text(self) -> Option<String> {
        match self {
            CallOutcome::Success(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

/// One prompt in, one outcome out. The engine is generic over this seam so
/// tests can script deterministic failures.
pub trait SummarizeBackend {
    fn complete(&self, prompt: &str) -> impl std::future::Future<Output = CallOutcome> + Send;
}

/// OpenAI-compatible chat-completions backend.
pub struct HttpSummarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpSummarizer {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .unwrap_or_default();
        HttpSummarizer {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    async fn request(&self, prompt: &str) -> CallOutcome {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": [ { "role": "user", "content": prompt } ],
            "temperature": 0.2,
        });

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return CallOutcome::Failure(CallFailure::Timeout),
            Err(err) => return CallOutcome::Failure(CallFailure::Network(err.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return CallOutcome::Failure(CallFailure::Status(status.as_u16()));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) => return CallOutcome::Failure(CallFailure::MalformedBody),
        };

        match extract_completion_text(&body) {
            Some(text) if !text.trim().is_empty() => CallOutcome::Success(text),
            _ => CallOutcome::Failure(CallFailure::MalformedBody),
        }
    }
}

impl SummarizeBackend for HttpSummarizer {
    async fn complete(&self, prompt: &str) -> CallOutcome {
        // The client carries its own timeout, but the pipeline contract is a
        // hard 25s wall per call including body reads.
        match tokio::time::timeout(CALL_TIMEOUT, self.request(prompt)).await {
            Ok(outcome) => outcome,
            Err(_) => CallOutcome::Failure(CallFailure::Timeout),
        }
    }
}

/// Pull the assistant text out of a chat-completions response body; the
/// `content` field is a string or an array of text parts.
fn extract_completion_text(body: &Value) -> Option<String> {
    let content = body
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?;
    match content {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let chunks: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            if chunks.is_empty() {
                None
            } else {
                Some(chunks.join("\n"))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_string_content() {
        let body = json!({
            "choices": [ { "message": { "content": "a fine summary" } } ]
        });
        assert_eq!(
            extract_completion_text(&body).as_deref(),
            Some("a fine summary")
        );
    }

    #[test]
    fn test_extract_part_array_content() {
        let body = json!({
            "choices": [ { "message": { "content": [
                { "type": "text", "text": "line one" },
                { "type": "text", "text": "line two" }
            ] } } ]
        });
        assert_eq!(
            extract_completion_text(&body).as_deref(),
            Some("line one\nline two")
        );
    }

    #[test]
    fn test_extract_malformed_body_is_none() {
        assert!(extract_completion_text(&json!({ "unexpected": true })).is_none());
        assert!(extract_completion_text(&json!({ "choices": [] })).is_none());
    }

    #[test]
    fn test_outcome_text_rules() {
        assert_eq!(
            CallOutcome::Success("ok".into()).into_text().as_deref(),
            Some("ok")
        );
        assert!(CallOutcome::Success("   ".into()).into_text().is_none());
        assert!(CallOutcome::Failure(CallFailure::Timeout)
            .into_text()
            .is_none());
    }
}
