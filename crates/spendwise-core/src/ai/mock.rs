//! Mock backend for testing
//!
//! Replays scripted replies and counts calls. Useful for unit tests and for
//! running the CLI or server without a model server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};

use super::types::ModelOutput;
use super::AIBackend;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    Output(ModelOutput),
    /// Simulated transport failure
    Fail(String),
}

/// Mock AI backend for testing
///
/// Scripted replies are served in order. Once the script runs out, every call
/// gets the fallback reply. Clones share the script, call counter and prompt logs.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    model: String,
    script: Arc<Mutex<VecDeque<MockReply>>>,
    fallback: MockReply,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    system_prompts: Arc<Mutex<Vec<Option<String>>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy, canned savings suggestion)
    pub fn new() -> Self {
        Self::with_fallback(MockReply::Output(ModelOutput::structured(json!({
            "suggestions": {
                "Savings": "Set aside a fixed share of income at the start of each month."
            }
        }))))
    }

    fn with_fallback(fallback: MockReply) -> Self {
        Self {
            healthy: true,
            model: "mock".to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            system_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always reply with this raw text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_fallback(MockReply::Output(ModelOutput::text(text)))
    }

    /// Always reply with this structured payload
    pub fn with_structured(value: Value) -> Self {
        Self::with_fallback(MockReply::Output(ModelOutput::structured(value)))
    }

    /// Always fail as if the model server were down
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_fallback(MockReply::Fail(message.into()))
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Queue a reply ahead of the fallback
    pub fn push_reply(&self, reply: MockReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Create a new instance with a different model name
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Number of completed `complete_json` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// System messages received so far, one entry per call
    pub fn system_prompts(&self) -> Vec<Option<String>> {
        self.system_prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete_json(&self, system: Option<&str>, prompt: &str) -> Result<ModelOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Ok(mut systems) = self.system_prompts.lock() {
            systems.push(system.map(str::to_string));
        }

        let reply = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            MockReply::Output(output) => Ok(output),
            MockReply::Fail(message) => Err(Error::ModelUnavailable(message)),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn kind(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_reply() {
        let mock = MockBackend::new();
        let output = mock.complete_json(Some("system"), "prompt").await.unwrap();
        assert!(output.structured.unwrap()["suggestions"]["Savings"].is_string());
        assert_eq!(mock.calls(), 1);
        assert_eq!(mock.prompts(), vec!["prompt".to_string()]);
        assert_eq!(mock.system_prompts(), vec![Some("system".to_string())]);
    }

    #[tokio::test]
    async fn test_script_then_fallback() {
        let mock = MockBackend::with_text("fallback");
        mock.push_reply(MockReply::Fail("down".into()));

        assert!(mock.complete_json(None, "a").await.unwrap_err().is_transport());
        let output = mock.complete_json(None, "b").await.unwrap();
        assert_eq!(output.text.as_deref(), Some("fallback"));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_counter() {
        let mock = MockBackend::new();
        let clone = mock.with_model("other");
        clone.complete_json(None, "x").await.unwrap();
        assert_eq!(mock.calls(), 1);
        assert_eq!(clone.model(), "other");
    }

    #[tokio::test]
    async fn test_health() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
