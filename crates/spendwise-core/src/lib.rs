//! SpendWise Core Library
//!
//! Shared functionality for the SpendWise budgeting tool:
//! - Expense, budget and settings models with the category catalog
//! - Spending aggregation and budget progress math
//! - Pluggable local AI backends (Ollama, OpenAI-compatible servers, mock)
//! - Prompt library for customizable AI prompts
//! - Budget advisory pipeline (validate, prompt, call, tolerant parse)
//! - Layered TOML + environment configuration

pub mod advisory;
pub mod ai;
pub mod budget;
pub mod config;
pub mod error;
pub mod models;
pub mod prompts;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisory::{validate_request, AdvisoryPipeline};
pub use ai::{
    AIBackend, AIClient, BackendInfo, MockBackend, MockReply, ModelOutput, OllamaBackend,
    OpenAICompatibleBackend, ParseFailure,
};
pub use config::{AiConfig, BackendKind, Config};
pub use error::{Error, Result};
pub use models::{
    AdvisoryRequest, AdvisoryResponse, AppSettings, Budget, BudgetProgress, Category,
    CategoryTotal, Expense,
};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary, RenderedPrompt};
