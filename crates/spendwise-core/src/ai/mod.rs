//! Pluggable local AI backend abstraction
//!
//! This module provides a backend-agnostic interface for the one model
//! operation the advisory pipeline needs: send a prompt, get JSON-ish text back.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the interface for all AI backends
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//! - `parsing`: digs the suggestions object out of whatever the model said
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::load()?;
//! let client = AIClient::from_config(&config.ai)?;
//! let output = client.complete_json(Some(&system), &prompt).await?;
//! let response = parse_advisory_output(&output);
//! ```
//!
//! # Configuration
//!
//! See [`crate::config`] for the TOML file and environment variables
//! (`AI_BACKEND`, `OLLAMA_HOST`, `OPENAI_COMPATIBLE_HOST`, ...).

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::{MockBackend, MockReply};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use parsing::{parse_advisory_output, ParseFailure};
pub use types::*;

use async_trait::async_trait;

use crate::config::{AiConfig, BackendKind};
use crate::error::Result;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send a prompt (with an optional system message) asking for a JSON reply
    ///
    /// Errors only on transport failure (unreachable, timeout, non-2xx).
    /// A reply that is not usable JSON is still `Ok`.
    async fn complete_json(&self, system: Option<&str>, prompt: &str) -> Result<ModelOutput>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Backend kind name (for logging)
    fn kind(&self) -> &'static str;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;

    /// Identity snapshot for health reporting
    fn info(&self) -> BackendInfo {
        BackendInfo {
            kind: self.kind().to_string(),
            host: self.host().to_string(),
            model: self.model().to_string(),
        }
    }
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// OpenAI-compatible backend (Docker Model Runner, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from resolved configuration
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        Ok(match config.backend {
            BackendKind::Ollama => AIClient::Ollama(OllamaBackend::from_config(config)?),
            BackendKind::OpenAICompatible => {
                AIClient::OpenAICompatible(OpenAICompatibleBackend::from_config(config)?)
            }
            BackendKind::Mock => AIClient::Mock(MockBackend::new()),
        })
    }

    /// Create an Ollama backend directly
    pub fn ollama(host: &str, model: &str) -> Self {
        AIClient::Ollama(OllamaBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            AIClient::OpenAICompatible(b) => AIClient::OpenAICompatible(b.with_model(model)),
            AIClient::Mock(b) => AIClient::Mock(b.with_model(model)),
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn complete_json(&self, system: Option<&str>, prompt: &str) -> Result<ModelOutput> {
        match self {
            AIClient::Ollama(b) => b.complete_json(system, prompt).await,
            AIClient::OpenAICompatible(b) => b.complete_json(system, prompt).await,
            AIClient::Mock(b) => b.complete_json(system, prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AIClient::Ollama(b) => b.kind(),
            AIClient::OpenAICompatible(b) => b.kind(),
            AIClient::Mock(b) => b.kind(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
