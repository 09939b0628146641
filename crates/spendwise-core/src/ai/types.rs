//! AI backend response types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde_json::Value;

/// What a model call produced
///
/// Backends fill `structured` when the service hands back an already-parsed
/// JSON payload and `text` with the raw completion. Either, both, or neither
/// may be present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOutput {
    pub structured: Option<Value>,
    pub text: Option<String>,
}

impl ModelOutput {
    /// Output carrying only raw text (blank text counts as none)
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            structured: None,
            text: if text.trim().is_empty() {
                None
            } else {
                Some(text)
            },
        }
    }

    /// Output carrying a structured JSON payload
    pub fn structured(value: Value) -> Self {
        Self {
            structured: if value.is_null() { None } else { Some(value) },
            text: None,
        }
    }

    /// The model said nothing at all
    pub fn is_empty(&self) -> bool {
        self.structured.is_none() && self.text.is_none()
    }
}

/// Backend identity for logging and health reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    /// Backend kind (ollama, openai_compatible, mock)
    pub kind: String,
    pub host: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_is_empty() {
        assert!(ModelOutput::text("   \n").is_empty());
        assert!(!ModelOutput::text("hi").is_empty());
    }

    #[test]
    fn test_null_structured_is_empty() {
        assert!(ModelOutput::structured(Value::Null).is_empty());
        assert!(!ModelOutput::structured(serde_json::json!({})).is_empty());
    }
}
