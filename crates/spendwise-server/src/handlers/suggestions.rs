//! Budget advisor handlers

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::{AppError, AppState};
use spendwise_core::budget::expenses_in_month;
use spendwise_core::{AdvisoryRequest, AdvisoryResponse, AppSettings, Budget, Error, Expense};

/// POST /api/suggestions - Per-category budget suggestions
///
/// 400 on a malformed request, 502 when the model server fails, 503 when no
/// backend is configured. Unusable model output is a 200 with no suggestions.
pub async fn get_suggestions(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AdvisoryResponse>, AppError> {
    let Json(body) = body.map_err(AppError::from_rejection)?;
    let advisor = state
        .advisor
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("AI backend not configured"))?;

    let response = advisor
        .get_suggestions_json(body)
        .await
        .map_err(advisory_error)?;

    Ok(Json(response))
}

/// Stored data the advisor page works from
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub settings: AppSettings,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub financial_context: Option<String>,
    /// Only count expenses in this instant's calendar month
    #[serde(default)]
    pub month_of: Option<DateTime<Utc>>,
}

/// POST /api/suggestions/snapshot - Suggestions from settings, expenses and budgets
///
/// Expenses are summed per category and the last budget per category becomes
/// its goal. Income must be set (400 otherwise).
pub async fn get_snapshot_suggestions(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SnapshotRequest>, JsonRejection>,
) -> Result<Json<AdvisoryResponse>, AppError> {
    let Json(body) = body.map_err(AppError::from_rejection)?;
    let advisor = state
        .advisor
        .as_ref()
        .ok_or_else(|| AppError::service_unavailable("AI backend not configured"))?;

    let expenses = match body.month_of {
        Some(month) => expenses_in_month(&body.expenses, month),
        None => body.expenses,
    };
    let request = AdvisoryRequest::from_snapshot(
        &body.settings,
        &expenses,
        &body.budgets,
        body.financial_context.as_deref(),
    )
    .map_err(advisory_error)?;

    let response = advisor
        .get_suggestions(&request)
        .await
        .map_err(advisory_error)?;

    Ok(Json(response))
}

fn advisory_error(err: Error) -> AppError {
    match err {
        Error::Validation(msg) => AppError::bad_request(&msg),
        e if e.is_transport() => {
            warn!(error = %e, "AI backend request failed");
            AppError::bad_gateway("AI backend unavailable")
        }
        e => e.into(),
    }
}
