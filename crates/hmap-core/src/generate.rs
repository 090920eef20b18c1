//! AI text generation seam.
//!
//! [`TextGenerator`] is the only way the core talks to a model. The HTTP
//! implementation targets the `generateContent` REST endpoint.

use crate::config::AiConfig;
use crate::error::{HmapError, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// JSON schema for structured output. `None` asks for free text.
    pub schema: Option<Value>,
}

impl GenerationRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            schema: None,
        }
    }
}

pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

pub struct HttpGenerator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl HttpGenerator {
    pub fn new(cfg: &AiConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(HmapError::Generation(
                "no API key configured; run 'hmap config set-key'".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn body(request: &GenerationRequest) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }]
        });
        if let Some(schema) = &request.schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }
        body
    }
}

impl TextGenerator for HttpGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, request.model
        );
        tracing::debug!(model = %request.model, prompt_len = request.prompt.len(), "requesting generation");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::body(request))
            .send()?;

        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            let detail: String = text.chars().take(200).collect();
            return Err(HmapError::Generation(format!("HTTP {status}: {detail}")));
        }

        let value: Value = serde_json::from_str(&text)?;
        extract_text(&value)
    }
}

/// Concatenate `candidates[0].content.parts[*].text`.
pub fn extract_text(response: &Value) -> Result<String> {
    let parts = response
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| HmapError::Generation("response has no candidates".to_string()))?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        return Err(HmapError::Generation("model returned empty text".to_string()));
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Busy flags
// ---------------------------------------------------------------------------

/// Per-document in-flight flags. A second request for a busy document is
/// refused; other documents are unaffected.
#[derive(Debug, Default)]
pub struct GenerationTracker {
    busy: RefCell<HashSet<String>>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, doc_id: &str) -> Result<GenerationGuard<'_>> {
        if !self.busy.borrow_mut().insert(doc_id.to_string()) {
            return Err(HmapError::GenerationInFlight(doc_id.to_string()));
        }
        Ok(GenerationGuard {
            tracker: self,
            doc_id: doc_id.to_string(),
        })
    }

    pub fn is_busy(&self, doc_id: &str) -> bool {
        self.busy.borrow().contains(doc_id)
    }
}

/// Clears the busy flag when dropped, whatever the request's outcome.
#[derive(Debug)]
pub struct GenerationGuard<'a> {
    tracker: &'a GenerationTracker,
    doc_id: String,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.tracker.busy.borrow_mut().remove(&self.doc_id);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
