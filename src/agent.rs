// 🤖 Chat Bridge - Stateless pass-through to the hosted reasoning engine
// One message in, one reply out. No conversation state is kept server-side,
// and an upstream failure degrades to a fixed fallback reply.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

use crate::categories::{match_fixed_category, FIXED_CATEGORIES};

/// Reply returned to the caller when the engine is unreachable or errors.
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't reach the finance assistant right now. Please try again in a moment.";

// ============================================================================
// REASONING CLIENT
// ============================================================================

/// HTTP client for the hosted reasoning engine.
pub struct ReasoningClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl ReasoningClient {
    /// Create a client. A missing endpoint is allowed: every query then
    /// fails cleanly and chat degrades to the fallback reply.
    pub fn new(endpoint: Option<String>, api_key: Option<String>) -> Self {
        ReasoningClient {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Send one message to the engine and return its textual reply.
    pub async fn query(&self, message: &str) -> Result<String> {
        let endpoint = match &self.endpoint {
            Some(url) => url,
            None => bail!("REASONING_ENGINE_URL is not set"),
        };

        let mut request = self.http.post(endpoint).json(&json!({ "input": message }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("reasoning engine request failed")?
            .error_for_status()
            .context("reasoning engine returned an error status")?;

        let body: Value = response
            .json()
            .await
            .context("reasoning engine reply was not JSON")?;

        Ok(extract_reply(&body))
    }

    /// Chat entrypoint: never errors. Upstream failure logs and returns
    /// the fallback reply.
    pub async fn chat(&self, message: &str) -> String {
        match self.query(message).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "reasoning engine query failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Ask the engine to pick exactly one fixed category for a transaction.
    ///
    /// Ok(None) when the reply isn't exactly one fixed category; the caller
    /// falls back to the heuristic either way.
    pub async fn suggest_category(&self, description: &str, amount: &str) -> Result<Option<String>> {
        let prompt = format!(
            "Choose exactly one category from this list:\n{}\nTransaction: description={:?}, amount={:?}. Respond with only the category name.",
            FIXED_CATEGORIES.join(", "),
            description,
            amount,
        );
        let reply = self.query(&prompt).await?;
        Ok(match_fixed_category(&reply).map(|c| c.to_string()))
    }
}

// ============================================================================
// REPLY EXTRACTION
// ============================================================================

/// Pull a reply string out of whatever shape the engine returns.
///
/// JSON objects yield the first of output/response/reply/text; bare
/// strings are unquoted; anything else is stringified as-is.
pub fn extract_reply(value: &Value) -> String {
    if let Value::Object(map) = value {
        for key in ["output", "response", "reply", "text"] {
            if let Some(inner) = map.get(key) {
                return match inner {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
            }
        }
    }
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
