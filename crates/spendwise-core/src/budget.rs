//! Expense aggregation and budget math
//!
//! Turns raw expense and budget documents into the per-category totals the
//! dashboard, reports, and the budget advisor consume.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};

use crate::error::{Error, Result};
use crate::models::{
    AdvisoryRequest, AppSettings, Budget, BudgetProgress, Category, CategoryTotal, Expense,
};

/// Sum expenses per category
///
/// Every expense category starts at zero so the advisor sees categories with
/// no spending. Expenses filed under Income are ignored.
pub fn aggregate_expenses(expenses: &[Expense]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = Category::expense_categories()
        .map(|c| (c.as_str().to_string(), 0.0))
        .collect();

    for expense in expenses {
        if let Some(total) = totals.get_mut(expense.category.as_str()) {
            *total += expense.amount;
        }
    }

    totals
}

/// Budget goals keyed by category label (last budget per category wins)
pub fn budget_goals(budgets: &[Budget]) -> BTreeMap<String, f64> {
    budgets
        .iter()
        .map(|b| (b.category.as_str().to_string(), b.amount))
        .collect()
}

/// Total spent in one category
pub fn spent_in(expenses: &[Expense], category: Category) -> f64 {
    expenses
        .iter()
        .filter(|e| e.category == category)
        .map(|e| e.amount)
        .sum()
}

/// Total spent across all expenses
pub fn total_spent(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Spend against every budget with a positive goal
pub fn budget_progress(budgets: &[Budget], expenses: &[Expense]) -> Vec<BudgetProgress> {
    budgets
        .iter()
        .filter(|b| b.amount > 0.0)
        .map(|b| {
            let spent = spent_in(expenses, b.category);
            BudgetProgress {
                category: b.category,
                goal: b.amount,
                spent,
                remaining: (b.amount - spent).max(0.0),
                overspent: (spent - b.amount).max(0.0),
                percent: spent / b.amount * 100.0,
            }
        })
        .collect()
}

/// Non-zero spending per expense category, in catalog order
pub fn spending_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    Category::expense_categories()
        .map(|category| CategoryTotal {
            category,
            total: spent_in(expenses, category),
        })
        .filter(|t| t.total > 0.0)
        .collect()
}

/// Expenses dated in the same calendar month as `now`
pub fn expenses_in_month(expenses: &[Expense], now: DateTime<Utc>) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|e| e.date.year() == now.year() && e.date.month() == now.month())
        .cloned()
        .collect()
}

/// Format an amount for display in the given currency
pub fn format_currency(amount: f64, currency: &str) -> String {
    let symbol = match currency.to_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    };

    let sign = if amount < 0.0 { "-" } else { "" };
    match symbol {
        Some(s) => format!("{}{}{:.2}", sign, s, amount.abs()),
        None => format!("{} {:.2}", currency.to_uppercase(), amount),
    }
}

impl AdvisoryRequest {
    /// Assemble a request from stored settings, expenses, and budgets
    ///
    /// Income must be set (positive) before suggestions can be generated.
    pub fn from_snapshot(
        settings: &AppSettings,
        expenses: &[Expense],
        budgets: &[Budget],
        financial_context: Option<&str>,
    ) -> Result<Self> {
        if settings.monthly_income.is_nan() || settings.monthly_income <= 0.0 {
            return Err(Error::Validation(
                "monthly income must be set before generating suggestions".into(),
            ));
        }

        let language = if settings.language.trim().is_empty() {
            None
        } else {
            Some(settings.language.clone())
        };

        Ok(Self {
            income: settings.monthly_income,
            expenses: aggregate_expenses(expenses),
            budget_goals: budget_goals(budgets),
            language,
            financial_context: financial_context
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        })
    }
}
