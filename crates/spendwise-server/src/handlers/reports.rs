//! Report handlers
//!
//! Stateless: the client posts its expenses and budgets, the server does the math.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use spendwise_core::budget::{
    budget_progress, expenses_in_month, format_currency, spending_by_category, total_spent,
};
use spendwise_core::{Budget, BudgetProgress, CategoryTotal, Expense};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgressRequest {
    pub expenses: Vec<Expense>,
    pub budgets: Vec<Budget>,
    /// Restrict to expenses in this instant's calendar month
    #[serde(default)]
    pub month_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgressReport {
    pub progress: Vec<BudgetProgress>,
    pub total_goal: f64,
    pub total_spent: f64,
    /// `total_spent` formatted in the configured currency
    pub total_spent_display: String,
    pub over_budget: usize,
}

/// POST /api/reports/budget-progress - Spend against each budget goal
pub async fn report_budget_progress(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BudgetProgressRequest>, JsonRejection>,
) -> Result<Json<BudgetProgressReport>, AppError> {
    let Json(body) = body.map_err(AppError::from_rejection)?;
    let expenses = match body.month_of {
        Some(month) => expenses_in_month(&body.expenses, month),
        None => body.expenses,
    };

    let progress = budget_progress(&body.budgets, &expenses);
    let total_goal = progress.iter().map(|p| p.goal).sum();
    let spent = total_spent(&expenses);
    let over_budget = progress.iter().filter(|p| p.is_over()).count();

    Ok(Json(BudgetProgressReport {
        progress,
        total_goal,
        total_spent: spent,
        total_spent_display: format_currency(spent, &state.config.default_currency),
        over_budget,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SpendingRequest {
    pub expenses: Vec<Expense>,
}

/// POST /api/reports/spending - Non-zero spending per category
pub async fn report_spending(
    body: Result<Json<SpendingRequest>, JsonRejection>,
) -> Result<Json<Vec<CategoryTotal>>, AppError> {
    let Json(body) = body.map_err(AppError::from_rejection)?;
    Ok(Json(spending_by_category(&body.expenses)))
}
