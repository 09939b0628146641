//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::json;
use spendwise_core::{MockBackend, PromptLibrary};
use tower::ServiceExt;

fn setup_test_app_with(mock: MockBackend) -> Router {
    let advisor = AdvisoryPipeline::from_library(
        AIClient::Mock(mock),
        &mut PromptLibrary::embedded_only(),
    )
    .unwrap();
    create_router_with_advisor(Config::default(), Some(advisor), None, ServerConfig::default())
}

fn setup_test_app() -> Router {
    setup_test_app_with(MockBackend::new())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn valid_request() -> serde_json::Value {
    json!({
        "income": 3000,
        "expenses": {"Food": 420.5, "Housing": 1200},
        "budgetGoals": {"Food": 400},
        "language": "en-US"
    })
}

// ========== Health API Tests ==========

#[tokio::test]
async fn test_health() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["ai"]["configured"], true);
    assert_eq!(json["ai"]["available"], true);
    assert_eq!(json["ai"]["backend"], "mock");
}

#[tokio::test]
async fn test_health_without_backend() {
    let app = create_router_with_advisor(Config::default(), None, None, ServerConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ai"]["configured"], false);
    assert_eq!(json["ai"]["backend"], "ollama");
}

#[tokio::test]
async fn test_list_categories() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let categories = json.as_array().unwrap();
    assert_eq!(categories.len(), 11);
    assert_eq!(categories[0], "Food");
}

// ========== Suggestions API Tests ==========

#[tokio::test]
async fn test_suggestions_ok() {
    let mock = MockBackend::with_structured(json!({
        "suggestions": {"Food": "Cook at home more often."}
    }));
    let app = setup_test_app_with(mock.clone());

    let response = app
        .oneshot(post_json("/api/suggestions", valid_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["suggestions"]["Food"], "Cook at home more often.");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_suggestions_degrade_to_empty() {
    let app = setup_test_app_with(MockBackend::with_text("I cannot help with that."));

    let response = app
        .oneshot(post_json("/api/suggestions", valid_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json, json!({"suggestions": {}}));
}

#[tokio::test]
async fn test_suggestions_validation_error() {
    let mock = MockBackend::new();
    let app = setup_test_app_with(mock.clone());

    let response = app
        .oneshot(post_json(
            "/api/suggestions",
            json!({"income": "abc", "expenses": {}, "budgetGoals": {}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("income"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_suggestions_negative_income() {
    let mock = MockBackend::new();
    let app = setup_test_app_with(mock.clone());

    let response = app
        .oneshot(post_json(
            "/api/suggestions",
            json!({"income": -5, "expenses": {}, "budgetGoals": {}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_suggestions_transport_error() {
    let app = setup_test_app_with(MockBackend::failing("connection refused"));

    let response = app
        .oneshot(post_json("/api/suggestions", valid_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = get_body_json(response).await;
    assert_eq!(json["error"], "AI backend unavailable");
}

#[tokio::test]
async fn test_suggestions_without_backend() {
    let app = create_router_with_advisor(Config::default(), None, None, ServerConfig::default());

    let response = app
        .oneshot(post_json("/api/suggestions", valid_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_suggestions_malformed_json_body() {
    let mock = MockBackend::new();
    let app = setup_test_app_with(mock.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/suggestions")
                .header("content-type", "application/json")
                .body(Body::from("{\"income\": 3000,"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].is_string());
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_suggestions_missing_content_type() {
    let app = setup_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/suggestions")
                .body(Body::from(valid_request().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let json = get_body_json(response).await;
    assert!(json["error"].is_string());
}

// ========== Snapshot Suggestions Tests ==========

#[tokio::test]
async fn test_snapshot_suggestions() {
    let mock = MockBackend::with_structured(json!({
        "suggestions": {"Food": "Cook at home more often."}
    }));
    let app = setup_test_app_with(mock.clone());

    let response = app
        .oneshot(post_json(
            "/api/suggestions/snapshot",
            json!({
                "settings": {"monthlyIncome": 3000, "currency": "USD", "language": "fr-FR"},
                "expenses": report_expenses(),
                "budgets": [
                    {"category": "Food", "amount": 300.0},
                    {"category": "Food", "amount": 400.0}
                ],
                "financialContext": "  Saving for a trip  ",
                "monthOf": "2024-03-20T00:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["suggestions"]["Food"], "Cook at home more often.");

    let prompt = &mock.prompts()[0];
    assert!(prompt.contains("Income: 3000"));
    assert!(prompt.contains("  - Food: 450"));
    // February entertainment is outside the month
    assert!(prompt.contains("  - Entertainment: 0"));
    assert!(prompt.contains("Budget Goals:\n  - Food: 400"));
    assert!(prompt.contains("response in fr-FR."));
    assert!(prompt.contains("Financial Context/Goals: Saving for a trip\n"));
}

#[tokio::test]
async fn test_snapshot_requires_income() {
    let mock = MockBackend::new();
    let app = setup_test_app_with(mock.clone());

    let response = app
        .oneshot(post_json(
            "/api/suggestions/snapshot",
            json!({
                "settings": {"monthlyIncome": 0, "currency": "USD", "language": "en-US"},
                "expenses": report_expenses(),
                "budgets": []
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("monthly income"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_report_rejects_wrong_shape() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/reports/spending",
            json!({"expenses": "not a list"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = get_body_json(response).await;
    assert!(json["error"].is_string());
}

// ========== Report API Tests ==========

fn report_expenses() -> serde_json::Value {
    json!([
        {"date": "2024-03-02T10:00:00Z", "amount": 300.0, "category": "Food"},
        {"date": "2024-03-15T10:00:00Z", "amount": 150.0, "category": "Food"},
        {"date": "2024-03-03T10:00:00Z", "amount": 1200.0, "category": "Housing"},
        {"date": "2024-02-20T10:00:00Z", "amount": 80.0, "category": "Entertainment"}
    ])
}

#[tokio::test]
async fn test_budget_progress_report() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/reports/budget-progress",
            json!({
                "expenses": report_expenses(),
                "budgets": [
                    {"category": "Food", "amount": 400.0},
                    {"category": "Entertainment", "amount": 100.0},
                    {"category": "Health", "amount": 0.0}
                ],
                "monthOf": "2024-03-20T00:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;

    let progress = json["progress"].as_array().unwrap();
    assert_eq!(progress.len(), 2);
    assert_eq!(progress[0]["category"], "Food");
    assert_eq!(progress[0]["spent"], 450.0);
    assert_eq!(progress[0]["overspent"], 50.0);
    // February entertainment is outside the reporting month
    assert_eq!(progress[1]["spent"], 0.0);

    assert_eq!(json["totalGoal"], 500.0);
    assert_eq!(json["totalSpent"], 1650.0);
    assert_eq!(json["totalSpentDisplay"], "$1650.00");
    assert_eq!(json["overBudget"], 1);
}

#[tokio::test]
async fn test_spending_report() {
    let app = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/api/reports/spending",
            json!({"expenses": report_expenses()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    let totals = json.as_array().unwrap();
    assert_eq!(totals.len(), 3);
    assert_eq!(totals[0]["category"], "Food");
    assert_eq!(totals[0]["total"], 450.0);
}
