//! Integration tests for spendwise-core
//!
//! These tests exercise the full snapshot -> prompt -> Ollama -> suggestions
//! workflow against a mock Ollama server.

use chrono::{TimeZone, Utc};
use spendwise_core::{
    test_utils::{MockGenerate, MockOllamaServer},
    AIBackend, AIClient, AdvisoryPipeline, AdvisoryRequest, AppSettings, Budget, Category, Error,
    Expense, PromptLibrary,
};

fn pipeline_for(server: &MockOllamaServer) -> AdvisoryPipeline {
    let client = AIClient::ollama(&server.url(), "llama3.2");
    AdvisoryPipeline::from_library(client, &mut PromptLibrary::embedded_only())
        .expect("embedded prompt loads")
}

fn expense(day: u32, amount: f64, category: Category) -> Expense {
    Expense {
        id: String::new(),
        date: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        amount,
        category,
        description: None,
    }
}

fn snapshot() -> AdvisoryRequest {
    let settings = AppSettings {
        monthly_income: 3000.0,
        ..AppSettings::default()
    };
    let expenses = vec![
        expense(1, 300.0, Category::Food),
        expense(9, 120.5, Category::Food),
        expense(3, 1200.0, Category::Housing),
    ];
    let budgets = vec![Budget {
        id: String::new(),
        category: Category::Food,
        amount: 400.0,
    }];

    AdvisoryRequest::from_snapshot(&settings, &expenses, &budgets, Some("Saving for a trip"))
        .expect("valid snapshot")
}

// =============================================================================
// Ollama Round Trips
// =============================================================================

#[tokio::test]
async fn test_suggestions_from_mock_ollama() {
    let server = MockOllamaServer::start().await;
    let pipeline = pipeline_for(&server);

    assert!(pipeline.backend().health_check().await);

    let resp = pipeline.get_suggestions(&snapshot()).await.unwrap();
    assert_eq!(resp.suggestions.len(), 1);
    assert!(resp.suggestions.contains_key("Food"));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["format"], "json");
    assert_eq!(requests[0]["stream"], false);

    let prompt = requests[0]["prompt"].as_str().unwrap();
    assert!(prompt.contains("  - Food: 420.5"));
    assert!(prompt.contains("  - Housing: 1200"));
    assert!(prompt.contains("Financial Context/Goals: Saving for a trip"));

    let system = requests[0]["system"].as_str().unwrap();
    assert!(system.contains("personal finance advisor"));
    assert!(!prompt.contains("personal finance advisor"));
}

#[tokio::test]
async fn test_reply_wrapped_in_prose() {
    let server = MockOllamaServer::start_with_reply(
        "Here is my advice:\n```json\n{\"suggestions\": {\"Housing\": \"Look for a roommate.\"}}\n```",
    )
    .await;

    let resp = pipeline_for(&server).get_suggestions(&snapshot()).await.unwrap();
    assert_eq!(resp.suggestions["Housing"], "Look for a roommate.");
}

#[tokio::test]
async fn test_garbage_reply_degrades_to_empty() {
    let server = MockOllamaServer::start_with_reply("I cannot help with that.").await;

    let resp = pipeline_for(&server).get_suggestions(&snapshot()).await.unwrap();
    assert!(resp.is_empty());
    assert_eq!(serde_json::to_value(&resp).unwrap(), serde_json::json!({"suggestions": {}}));
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = MockOllamaServer::start_with(MockGenerate::Status(500)).await;

    let err = pipeline_for(&server)
        .get_suggestions(&snapshot())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ModelUnavailable(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_invalid_request_never_reaches_server() {
    let server = MockOllamaServer::start().await;

    let err = pipeline_for(&server)
        .get_suggestions_json(serde_json::json!({
            "income": "abc",
            "expenses": {},
            "budgetGoals": {}
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(server.requests().is_empty());
}
