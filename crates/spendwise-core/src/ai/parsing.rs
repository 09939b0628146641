//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in chatter ("Sure! Here you go: ...").
//! These helpers dig the object out and check it against the advisory
//! envelope. Failures are returned as a [`ParseFailure`] value rather than an
//! error so the caller decides how to degrade.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::models::AdvisoryResponse;

use super::types::ModelOutput;

/// Maximum characters of raw model output kept in diagnostics
const MAX_RAW_LEN: usize = 500;

/// Model text past this many bytes is not searched for a JSON object
const MAX_SCAN_BYTES: usize = 256 * 1024;

/// Balanced spans tried as JSON before giving up
const MAX_CANDIDATES: usize = 64;

/// Why a model reply could not be turned into an [`AdvisoryResponse`]
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    /// No text and no structured payload
    NoOutput,
    /// Text contained no balanced `{...}` span
    NoJsonObject { raw: String },
    /// Every balanced span failed to parse as JSON
    InvalidJson { raw: String, error: String },
    /// JSON parsed but is not `{"suggestions": {string: string}}`
    SchemaMismatch { payload: Value, error: String },
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoOutput => write!(f, "model returned no output"),
            Self::NoJsonObject { .. } => write!(f, "no JSON object found in model output"),
            Self::InvalidJson { error, .. } => write!(f, "invalid JSON in model output: {}", error),
            Self::SchemaMismatch { error, .. } => {
                write!(f, "model JSON did not match the suggestions schema: {}", error)
            }
        }
    }
}

/// Envelope the model is asked to produce
#[derive(Debug, Deserialize)]
struct SuggestionsEnvelope {
    suggestions: BTreeMap<String, String>,
}

/// Turn a model reply into an advisory response
///
/// A structured payload wins over text. Otherwise the first balanced `{...}`
/// span of the text that parses as JSON is used.
pub fn parse_advisory_output(output: &ModelOutput) -> Result<AdvisoryResponse, ParseFailure> {
    if let Some(ref payload) = output.structured {
        return validate_suggestions(payload.clone());
    }

    let text = match output.text.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(ParseFailure::NoOutput),
    };

    let mut first_error = None;
    for candidate in balanced_objects(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return validate_suggestions(value),
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    match first_error {
        Some(error) => Err(ParseFailure::InvalidJson {
            raw: truncate_for_log(text, MAX_RAW_LEN),
            error,
        }),
        None => Err(ParseFailure::NoJsonObject {
            raw: truncate_for_log(text, MAX_RAW_LEN),
        }),
    }
}

/// Check a parsed value against the `{"suggestions": {string: string}}` schema
///
/// Extra top-level keys are ignored.
pub fn validate_suggestions(payload: Value) -> Result<AdvisoryResponse, ParseFailure> {
    match SuggestionsEnvelope::deserialize(&payload) {
        Ok(envelope) => Ok(AdvisoryResponse {
            suggestions: envelope.suggestions,
        }),
        Err(e) => Err(ParseFailure::SchemaMismatch {
            payload,
            error: e.to_string(),
        }),
    }
}

/// Find the first balanced `{...}` span in `text`
pub fn extract_json_object(text: &str) -> Option<&str> {
    balanced_objects(text).next()
}

/// Every balanced `{...}` span, in order of its opening brace
///
/// One pass over the text with a stack of open braces, so the cost stays
/// linear however the braces are arranged. Braces inside JSON string literals
/// are not counted. Spans nested inside an earlier span are also yielded so a
/// valid inner object can still be found when the outer span is not JSON.
fn balanced_objects(text: &str) -> impl Iterator<Item = &str> + '_ {
    let text = clamp_to_char_boundary(text, MAX_SCAN_BYTES);
    let mut open: Vec<usize> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(move |(start, end)| &text[start..=end])
}

/// Longest prefix of `text` no longer than `max` bytes
fn clamp_to_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Shorten text for log lines without splitting a UTF-8 character
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
