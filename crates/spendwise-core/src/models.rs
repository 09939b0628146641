//! Domain models for SpendWise

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locale used when a request or settings document carries none
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Currency used when settings carry none
pub const DEFAULT_CURRENCY: &str = "USD";

/// User-facing spending bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Housing,
    Utilities,
    Entertainment,
    Health,
    Shopping,
    Education,
    Savings,
    Income,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Housing => "Housing",
            Self::Utilities => "Utilities",
            Self::Entertainment => "Entertainment",
            Self::Health => "Health",
            Self::Shopping => "Shopping",
            Self::Education => "Education",
            Self::Savings => "Savings",
            Self::Income => "Income",
            Self::Other => "Other",
        }
    }

    /// Every category, in display order
    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transport,
            Self::Housing,
            Self::Utilities,
            Self::Entertainment,
            Self::Health,
            Self::Shopping,
            Self::Education,
            Self::Savings,
            Self::Income,
            Self::Other,
        ]
    }

    /// Categories that money can be spent in (everything but Income)
    pub fn expense_categories() -> impl Iterator<Item = Category> {
        Self::all().iter().copied().filter(|c| *c != Self::Income)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Document ID from the store
    #[serde(default)]
    pub id: String,
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A per-category budget goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub id: String,
    pub category: Category,
    pub amount: f64,
}

/// Per-user application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub monthly_income: f64,
    pub currency: String,
    pub language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            monthly_income: 0.0,
            currency: DEFAULT_CURRENCY.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Financial snapshot sent to the budget advisor
///
/// Maps are ordered so the rendered prompt is stable for identical requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRequest {
    /// Monthly income, must be >= 0
    pub income: f64,
    /// Category label -> total spent
    pub expenses: BTreeMap<String, f64>,
    /// Category label -> goal amount
    pub budget_goals: BTreeMap<String, f64>,
    /// Locale tag for the reply language (e.g. "fr-FR")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Free-text goals or context from the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_context: Option<String>,
}

impl AdvisoryRequest {
    pub fn new(income: f64) -> Self {
        Self {
            income,
            expenses: BTreeMap::new(),
            budget_goals: BTreeMap::new(),
            language: None,
            financial_context: None,
        }
    }

    pub fn with_expense(mut self, category: &str, amount: f64) -> Self {
        self.expenses.insert(category.to_string(), amount);
        self
    }

    pub fn with_goal(mut self, category: &str, amount: f64) -> Self {
        self.budget_goals.insert(category.to_string(), amount);
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.financial_context = Some(context.to_string());
        self
    }

    /// Reply language, falling back to the default locale
    pub fn language(&self) -> &str {
        self.language_or(DEFAULT_LANGUAGE)
    }

    /// Reply language, falling back to `default` when unset or blank
    pub fn language_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(default)
    }

    /// Financial context if the user actually wrote something
    pub fn financial_context(&self) -> Option<&str> {
        self.financial_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

/// Budget suggestions from the advisor, keyed by category label
///
/// Keys are whatever the model returned; they are not checked against
/// [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryResponse {
    pub suggestions: BTreeMap<String, String>,
}

impl AdvisoryResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Spend against one budget goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub category: Category,
    pub goal: f64,
    pub spent: f64,
    /// `goal - spent`, never below zero
    pub remaining: f64,
    /// `spent - goal`, never below zero
    pub overspent: f64,
    /// `spent / goal * 100`
    pub percent: f64,
}

impl BudgetProgress {
    pub fn is_over(&self) -> bool {
        self.spent > self.goal
    }
}

/// One slice of the spending-by-category report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_case_insensitive() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" Transport ".parse::<Category>().unwrap(), Category::Transport);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_expense_categories_excludes_income() {
        let cats: Vec<_> = Category::expense_categories().collect();
        assert_eq!(cats.len(), 10);
        assert!(!cats.contains(&Category::Income));
    }

    #[test]
    fn test_advisory_request_camel_case() {
        let json = serde_json::json!({
            "income": 3000,
            "expenses": {"Food": 420.5},
            "budgetGoals": {"Food": 400},
            "financialContext": "Saving for a trip"
        });
        let req: AdvisoryRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.income, 3000.0);
        assert_eq!(req.budget_goals["Food"], 400.0);
        assert_eq!(req.language(), DEFAULT_LANGUAGE);
        assert_eq!(req.financial_context(), Some("Saving for a trip"));
    }

    #[test]
    fn test_blank_language_falls_back() {
        let req = AdvisoryRequest::new(100.0).with_language("  ");
        assert_eq!(req.language(), "en-US");
        assert_eq!(req.language_or("de-DE"), "de-DE");
        let req = AdvisoryRequest::new(100.0).with_context("   ");
        assert_eq!(req.financial_context(), None);
    }
}
