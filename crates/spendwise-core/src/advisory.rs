//! Budget advisory pipeline
//!
//! validate -> render prompt -> call model -> extract JSON -> check schema.
//!
//! Only two things surface as errors: a malformed request (before any model
//! call) and a transport failure talking to the model. Anything the model
//! says that cannot be used degrades to an empty suggestions map.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ai::parsing::{parse_advisory_output, truncate_for_log, ParseFailure};
use crate::ai::{AIBackend, AIClient};
use crate::error::{Error, Result};
use crate::models::{AdvisoryRequest, AdvisoryResponse, DEFAULT_LANGUAGE};
use crate::prompts::{Prompt, PromptId, PromptLibrary, PromptVars, RenderedPrompt};

/// Turns a financial snapshot into per-category suggestions
#[derive(Clone)]
pub struct AdvisoryPipeline<B = AIClient> {
    backend: B,
    prompt: Arc<Prompt>,
    default_language: String,
}

impl<B: AIBackend> AdvisoryPipeline<B> {
    pub fn new(backend: B, prompt: Prompt) -> Self {
        Self {
            backend,
            prompt: Arc::new(prompt),
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Build with the advisory prompt resolved from `library` (override or embedded)
    pub fn from_library(backend: B, library: &mut PromptLibrary) -> Result<Self> {
        let prompt = library.get(PromptId::SuggestBudgetAdjustments)?.clone();
        Ok(Self::new(backend, prompt))
    }

    /// Reply language used when a request carries none
    pub fn with_default_language(mut self, language: &str) -> Self {
        self.default_language = language.to_string();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Validate and render the exact system and user text the model would receive
    ///
    /// Identical requests always render identical text.
    pub fn render_prompt(&self, request: &AdvisoryRequest) -> Result<RenderedPrompt> {
        validate_request(request)?;

        let income = format_amount(request.income);
        let expenses = format_amount_list(&request.expenses);
        let budget_goals = format_amount_list(&request.budget_goals);

        let mut vars = PromptVars::new();
        vars.insert("language", request.language_or(&self.default_language));
        vars.insert("income", &income);
        vars.insert("expenses", &expenses);
        vars.insert("budget_goals", &budget_goals);
        if let Some(context) = request.financial_context() {
            vars.insert("financial_context", context);
        }

        Ok(self.prompt.render_parts(&vars))
    }

    /// Ask the model for budget suggestions
    ///
    /// Fails with [`Error::Validation`] before any model call when the request
    /// is malformed, and with a transport error when the model is unreachable.
    /// Unusable model output yields an empty response.
    pub async fn get_suggestions(&self, request: &AdvisoryRequest) -> Result<AdvisoryResponse> {
        let prompt = self.render_prompt(request)?;

        info!(
            backend = self.backend.kind(),
            model = self.backend.model(),
            categories = request.expenses.len(),
            "Requesting budget suggestions"
        );

        let output = self
            .backend
            .complete_json(prompt.system.as_deref(), &prompt.user)
            .await?;
        debug!(
            structured = output.structured.is_some(),
            "Model reply: {}",
            output
                .text
                .as_deref()
                .map(|t| truncate_for_log(t, 200))
                .unwrap_or_default()
        );

        let response = match parse_advisory_output(&output) {
            Ok(response) => response,
            Err(failure) => {
                log_degraded(&failure);
                AdvisoryResponse::empty()
            }
        };

        info!(suggestions = response.suggestions.len(), "Budget suggestions ready");
        Ok(response)
    }

    /// Validate an untyped JSON request, then ask for suggestions
    pub async fn get_suggestions_json(&self, value: Value) -> Result<AdvisoryResponse> {
        let request = AdvisoryRequest::from_json(value)?;
        self.get_suggestions(&request).await
    }
}

fn log_degraded(failure: &ParseFailure) {
    match failure {
        ParseFailure::NoOutput => {
            warn!("Model returned no output, returning no suggestions")
        }
        ParseFailure::NoJsonObject { raw } => {
            warn!(raw = %raw, "{}, returning no suggestions", failure)
        }
        ParseFailure::InvalidJson { raw, .. } => {
            warn!(raw = %raw, "{}, returning no suggestions", failure)
        }
        ParseFailure::SchemaMismatch { payload, .. } => {
            warn!(payload = %payload, "{}, returning no suggestions", failure)
        }
    }
}

/// Reject requests the model should never see
///
/// Income must be a finite number >= 0 and every map value finite.
pub fn validate_request(request: &AdvisoryRequest) -> Result<()> {
    if !request.income.is_finite() {
        return Err(Error::Validation("income must be a finite number".into()));
    }
    if request.income < 0.0 {
        return Err(Error::Validation("income must not be negative".into()));
    }

    for (field, map) in [
        ("expenses", &request.expenses),
        ("budgetGoals", &request.budget_goals),
    ] {
        if let Some((category, _)) = map.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "{}.{} must be a finite number",
                field, category
            )));
        }
    }

    Ok(())
}

impl AdvisoryRequest {
    /// Parse and validate an untyped JSON request
    ///
    /// Gives field-level messages ("income must be a number") instead of
    /// serde's positional ones.
    pub fn from_json(value: Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Validation("request must be a JSON object".into()))?;

        let income = match obj.get("income") {
            None | Some(Value::Null) => {
                return Err(Error::Validation("income is required".into()))
            }
            Some(v) => v
                .as_f64()
                .ok_or_else(|| Error::Validation("income must be a number".into()))?,
        };

        let expenses = numeric_map(obj.get("expenses"), "expenses")?;
        let budget_goals = numeric_map(obj.get("budgetGoals"), "budgetGoals")?;
        let language = optional_string(obj.get("language"), "language")?;
        let financial_context = optional_string(obj.get("financialContext"), "financialContext")?;

        let request = Self {
            income,
            expenses,
            budget_goals,
            language,
            financial_context,
        };
        validate_request(&request)?;
        Ok(request)
    }
}

fn numeric_map(
    value: Option<&Value>,
    field: &str,
) -> Result<std::collections::BTreeMap<String, f64>> {
    let obj = match value {
        Some(Value::Object(obj)) => obj,
        None | Some(Value::Null) => {
            return Err(Error::Validation(format!("{} is required", field)))
        }
        Some(_) => {
            return Err(Error::Validation(format!(
                "{} must be an object of numbers",
                field
            )))
        }
    };

    obj.iter()
        .map(|(category, amount)| {
            amount
                .as_f64()
                .map(|a| (category.clone(), a))
                .ok_or_else(|| {
                    Error::Validation(format!("{}.{} must be a number", field, category))
                })
        })
        .collect()
}

fn optional_string(value: Option<&Value>, field: &str) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::Validation(format!("{} must be a string", field))),
    }
}

/// Plain numeric rendering: 3000 -> "3000", 420.5 -> "420.5"
fn format_amount(amount: f64) -> String {
    amount.to_string()
}

/// One "  - Category: amount" line per entry, in category order
fn format_amount_list(map: &std::collections::BTreeMap<String, f64>) -> String {
    if map.is_empty() {
        return "  (none)".to_string();
    }
    map.iter()
        .map(|(category, amount)| format!("  - {}: {}", category, format_amount(*amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ai::{MockBackend, MockReply, ModelOutput};

    fn pipeline(mock: MockBackend) -> AdvisoryPipeline<MockBackend> {
        AdvisoryPipeline::from_library(mock, &mut PromptLibrary::embedded_only()).unwrap()
    }

    fn sample() -> AdvisoryRequest {
        AdvisoryRequest::new(3000.0)
            .with_expense("Food", 420.5)
            .with_expense("Housing", 1200.0)
            .with_goal("Food", 400.0)
    }

    #[test]
    fn test_render_prompt_contents() {
        let p = pipeline(MockBackend::new());
        let rendered = p.render_prompt(&sample()).unwrap();
        let prompt = &rendered.user;

        assert!(rendered
            .system
            .as_deref()
            .is_some_and(|s| s.contains("personal finance advisor")));
        assert!(prompt.contains("Income: 3000\n"));
        assert!(prompt.contains("  - Food: 420.5\n  - Housing: 1200"));
        assert!(prompt.contains("Budget Goals:\n  - Food: 400"));
        assert!(prompt.contains("Please provide your response in en-US."));
        assert!(!prompt.contains("Financial Context/Goals"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_render_prompt_is_deterministic() {
        let p = pipeline(MockBackend::new());
        let a = AdvisoryRequest::new(10.0)
            .with_expense("Transport", 1.0)
            .with_expense("Food", 2.0);
        let b = AdvisoryRequest::new(10.0)
            .with_expense("Food", 2.0)
            .with_expense("Transport", 1.0);
        assert_eq!(p.render_prompt(&a).unwrap(), p.render_prompt(&b).unwrap());
    }

    #[test]
    fn test_render_prompt_language_and_context() {
        let p = pipeline(MockBackend::new()).with_default_language("de-DE");
        let prompt = p.render_prompt(&sample()).unwrap().user;
        assert!(prompt.contains("response in de-DE."));

        let req = sample()
            .with_language("fr-FR")
            .with_context("Saving for a house in {{income}}");
        let prompt = p.render_prompt(&req).unwrap().user;
        assert!(prompt.contains("response in fr-FR."));
        assert!(prompt.contains("Financial Context/Goals: Saving for a house in {{income}}"));
    }

    #[test]
    fn test_empty_maps_render_placeholder() {
        let p = pipeline(MockBackend::new());
        let prompt = p.render_prompt(&AdvisoryRequest::new(0.0)).unwrap().user;
        assert!(prompt.contains("Expenses:\n  (none)"));
    }

    #[tokio::test]
    async fn test_happy_path() {
        let mock = MockBackend::with_structured(json!({"suggestions": {"Food": "Eat out less."}}));
        let p = pipeline(mock.clone());

        let resp = p.get_suggestions(&sample()).await.unwrap();
        assert_eq!(resp.suggestions["Food"], "Eat out less.");
        assert_eq!(mock.calls(), 1);
        let rendered = p.render_prompt(&sample()).unwrap();
        assert_eq!(mock.prompts()[0], rendered.user);
        assert_eq!(mock.system_prompts()[0], rendered.system);
    }

    #[tokio::test]
    async fn test_override_system_section_reaches_model() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("suggest_budget_adjustments.md"),
            "---\nid: suggest_budget_adjustments\nversion: 2\ntask_type: structured_extraction\n---\n\
             # System\nYou are a frugal advisor. Reply in {{language}}.\n\n# User\nIncome: {{income}}",
        )
        .unwrap();

        let mock = MockBackend::new();
        let mut library = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        let p = AdvisoryPipeline::from_library(mock.clone(), &mut library).unwrap();

        p.get_suggestions(&AdvisoryRequest::new(100.0)).await.unwrap();

        assert_eq!(mock.prompts(), vec!["Income: 100".to_string()]);
        assert_eq!(
            mock.system_prompts(),
            vec![Some("You are a frugal advisor. Reply in en-US.".to_string())]
        );
    }

    #[tokio::test]
    async fn test_chatty_text_reply() {
        let mock = MockBackend::with_text(
            "Sure! Here you go: {\"suggestions\": {\"Food\": \"Eat out less.\"}} Hope that helps!",
        );
        let resp = pipeline(mock).get_suggestions(&sample()).await.unwrap();
        assert_eq!(resp.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn test_degrades_to_empty() {
        for reply in [
            ModelOutput::text("I cannot help with that."),
            ModelOutput::text(r#"{"advice": {"Food": "x"}}"#),
            ModelOutput::text("{not json}"),
            ModelOutput::default(),
        ] {
            let mock = MockBackend::new();
            mock.push_reply(MockReply::Output(reply));
            let resp = pipeline(mock).get_suggestions(&sample()).await.unwrap();
            assert!(resp.is_empty());
        }
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mock = MockBackend::failing("connection refused");
        let err = pipeline(mock).get_suggestions(&sample()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_negative_income_never_calls_model() {
        let mock = MockBackend::new();
        let err = pipeline(mock.clone())
            .get_suggestions(&AdvisoryRequest::new(-5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_numeric_income_never_calls_model() {
        let mock = MockBackend::new();
        let err = pipeline(mock.clone())
            .get_suggestions_json(json!({"income": "abc", "expenses": {}, "budgetGoals": {}}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref m) if m.contains("income")));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn test_from_json_errors() {
        let cases = [
            (json!([1, 2]), "JSON object"),
            (json!({"expenses": {}, "budgetGoals": {}}), "income is required"),
            (json!({"income": 1, "budgetGoals": {}}), "expenses is required"),
            (json!({"income": 1, "expenses": [], "budgetGoals": {}}), "expenses must be"),
            (
                json!({"income": 1, "expenses": {"Food": "12"}, "budgetGoals": {}}),
                "expenses.Food",
            ),
            (
                json!({"income": 1, "expenses": {}, "budgetGoals": {}, "language": 5}),
                "language",
            ),
            (json!({"income": -1, "expenses": {}, "budgetGoals": {}}), "negative"),
        ];

        for (value, needle) in cases {
            match AdvisoryRequest::from_json(value.clone()) {
                Err(Error::Validation(msg)) => {
                    assert!(msg.contains(needle), "{} not in {:?} for {}", needle, msg, value)
                }
                other => panic!("expected validation error for {}, got {:?}", value, other),
            }
        }
    }

    #[test]
    fn test_from_json_accepts_full_request() {
        let req = AdvisoryRequest::from_json(json!({
            "income": 3000,
            "expenses": {"Food": 420.5},
            "budgetGoals": {"Food": 400},
            "language": "fr-FR",
            "financialContext": null
        }))
        .unwrap();
        assert_eq!(req.income, 3000.0);
        assert_eq!(req.language.as_deref(), Some("fr-FR"));
        assert!(req.financial_context.is_none());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        assert!(validate_request(&AdvisoryRequest::new(f64::NAN)).is_err());
        assert!(validate_request(&AdvisoryRequest::new(1.0).with_goal("Food", f64::INFINITY)).is_err());
        assert!(validate_request(&AdvisoryRequest::new(0.0)).is_ok());
    }
}
