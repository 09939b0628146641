//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - Docker Model Runner (http://localhost:12434)
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! Host, model and API key come from [`crate::config::AiConfig`]
//! (`OPENAI_COMPATIBLE_HOST`, `OPENAI_COMPATIBLE_MODEL`, `OPENAI_COMPATIBLE_API_KEY`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{Error, Result};

use super::types::ModelOutput;
use super::AIBackend;

/// OpenAI-compatible backend
///
/// Requests `response_format: {"type": "json_object"}`. Servers that return a
/// pre-parsed `message.parsed` payload have it surfaced as structured output.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            temperature: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }

    /// Create from config, applying its request timeout and temperature
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            base_url: config.host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: Some(config.temperature),
        })
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

fn chat_messages<'a>(system: Option<&'a str>, prompt: &'a str) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(2);
    if let Some(content) = system {
        messages.push(ChatMessage {
            role: "system",
            content,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: prompt,
    });
    messages
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    parsed: Option<Value>,
}

impl ChatCompletionResponse {
    fn into_output(self) -> ModelOutput {
        let Some(choice) = self.choices.into_iter().next() else {
            return ModelOutput::default();
        };

        let mut output = ModelOutput::text(choice.message.content.unwrap_or_default());
        output.structured = choice.message.parsed.filter(|v| !v.is_null());
        output
    }
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn complete_json(&self, system: Option<&str>, prompt: &str) -> Result<ModelOutput> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: chat_messages(system, prompt),
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            stream: false,
        };

        let mut req = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ModelUnavailable(format!(
                "OpenAI-compatible server returned {}: {}",
                status,
                body.trim()
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let output = completion.into_output();
        debug!(model = %self.model, "OpenAI-compatible response: {:?}", output.text);

        Ok(output)
    }

    async fn health_check(&self) -> bool {
        // /v1/models is standard; /health and / cover Docker Model Runner and LocalAI
        for path in ["/v1/models", "/health", ""] {
            let mut req = self.http_client.get(format!("{}{}", self.base_url, path));
            if let Some(ref key) = self.api_key {
                req = req.bearer_auth(key);
            }
            if let Ok(resp) = req.send().await {
                if resp.status().is_success() {
                    return true;
                }
            }
        }
        false
    }

    fn kind(&self) -> &'static str {
        "openai_compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
