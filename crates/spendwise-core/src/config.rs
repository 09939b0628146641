//! Application configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/spendwise/config/spendwise.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file was used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{DEFAULT_CURRENCY, DEFAULT_LANGUAGE};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/spendwise.toml");

/// Which model backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Ollama,
    OpenAICompatible,
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAICompatible => "openai_compatible",
            Self::Mock => "mock",
        }
    }

    /// Host used when none is configured for this backend
    pub fn default_host(&self) -> &'static str {
        match self {
            Self::Ollama => "http://localhost:11434",
            // Docker Model Runner
            Self::OpenAICompatible => "http://localhost:12434",
            Self::Mock => "mock://localhost",
        }
    }

    /// Model used when none is configured for this backend
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Ollama | Self::OpenAICompatible => "llama3.2",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenAICompatible)
            }
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown AI backend: {}", s)),
        }
    }
}

/// Model backend settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: BackendKind,
    pub host: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        let backend = BackendKind::Ollama;
        Self {
            backend,
            host: backend.default_host().to_string(),
            model: backend.default_model().to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            temperature: 0.2,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub ai: AiConfig,
    /// Reply language used when a request carries none
    pub default_language: String,
    pub default_currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ai: AiConfig::default(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Config {
    /// Load from the default override location (or embedded defaults), then apply env
    pub fn load() -> Result<Self> {
        let mut config = load_config(None)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path (embedded defaults if it does not exist), then apply env
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = load_config(Some(path))?;
        config.apply_env();
        Ok(config)
    }

    /// Parse config from TOML content without touching the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Apply environment variable overrides
    ///
    /// - `AI_BACKEND`: ollama, openai_compatible, mock
    /// - `OLLAMA_HOST` / `OLLAMA_MODEL`
    /// - `OPENAI_COMPATIBLE_HOST` / `OPENAI_COMPATIBLE_MODEL` / `OPENAI_COMPATIBLE_API_KEY`
    /// - `SPENDWISE_AI_TIMEOUT_SECS`
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = var("AI_BACKEND") {
            match backend.parse::<BackendKind>() {
                // Host and model from the file belong to the backend it named
                Ok(kind) if kind != self.ai.backend => {
                    self.ai.backend = kind;
                    self.ai.host = kind.default_host().to_string();
                    self.ai.model = kind.default_model().to_string();
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(backend = %backend, "{}, keeping {}", e, self.ai.backend.as_str()),
            }
        }

        match self.ai.backend {
            BackendKind::Ollama => {
                if let Some(host) = var("OLLAMA_HOST") {
                    self.ai.host = host;
                }
                if let Some(model) = var("OLLAMA_MODEL") {
                    self.ai.model = model;
                }
            }
            BackendKind::OpenAICompatible => {
                if let Some(host) = var("OPENAI_COMPATIBLE_HOST") {
                    self.ai.host = host;
                }
                if let Some(model) = var("OPENAI_COMPATIBLE_MODEL") {
                    self.ai.model = model;
                }
                if let Some(key) = var("OPENAI_COMPATIBLE_API_KEY") {
                    self.ai.api_key = Some(key);
                }
            }
            BackendKind::Mock => {}
        }

        if let Some(secs) = var("SPENDWISE_AI_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.ai.timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %secs, "Ignoring invalid SPENDWISE_AI_TIMEOUT_SECS"),
            }
        }
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendwise").join("config").join("spendwise.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<Config> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .filter(|p| p.exists());

    let content = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config override");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        None => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    ai: Option<RawAi>,
    defaults: Option<RawDefaults>,
}

#[derive(Debug, Deserialize)]
struct RawAi {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    language: Option<String>,
    currency: Option<String>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(ai) = raw.ai {
        if let Some(backend) = ai.backend {
            let kind: BackendKind = backend.parse().map_err(Error::Config)?;
            config.ai.backend = kind;
            config.ai.host = kind.default_host().to_string();
            config.ai.model = kind.default_model().to_string();
        }
        if let Some(host) = ai.host {
            config.ai.host = host;
        }
        if let Some(model) = ai.model {
            config.ai.model = model;
        }
        config.ai.api_key = ai.api_key.filter(|k| !k.is_empty());
        if let Some(timeout) = ai.timeout_secs {
            config.ai.timeout = Duration::from_secs(timeout);
        }
        if let Some(temperature) = ai.temperature {
            config.ai.temperature = temperature;
        }
    }

    if let Some(defaults) = raw.defaults {
        if let Some(language) = defaults.language {
            config.default_language = language;
        }
        if let Some(currency) = defaults.currency {
            config.default_currency = currency;
        }
    }

    Ok(config)
}
