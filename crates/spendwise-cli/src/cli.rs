//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// SpendWise - Budget suggestions from a local model
#[derive(Parser)]
#[command(name = "spendwise")]
#[command(about = "Personal budgeting with AI suggestions from a local model", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the model for per-category budget suggestions
    Suggest {
        #[command(flatten)]
        request: RequestArgs,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,

        /// Use a different model than the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the prompt that would be sent, without calling the model
    Prompt {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// AI backend utilities
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },

    /// Manage AI prompts (list, show, path)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory with the web UI to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

/// Financial snapshot given on the command line or in a JSON file
#[derive(Args, Debug, Default)]
pub struct RequestArgs {
    /// JSON file with {income, expenses, budgetGoals, language?, financialContext?}
    #[arg(short, long, conflicts_with_all = ["income", "expenses", "goals"])]
    pub input: Option<PathBuf>,

    /// Monthly income
    #[arg(long)]
    pub income: Option<f64>,

    /// Spending in a category, as Category=Amount (repeatable)
    #[arg(short, long = "expense", value_parser = parse_amount)]
    pub expenses: Vec<(String, f64)>,

    /// Budget goal for a category, as Category=Amount (repeatable)
    #[arg(short, long = "goal", value_parser = parse_amount)]
    pub goals: Vec<(String, f64)>,

    /// Reply language (e.g. fr-FR)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Free-text goals or context
    #[arg(short, long)]
    pub context: Option<String>,
}

/// Parse `Category=Amount`
pub fn parse_amount(s: &str) -> Result<(String, f64), String> {
    let (category, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Category=Amount, got '{}'", s))?;

    let category = category.trim();
    if category.is_empty() {
        return Err(format!("missing category in '{}'", s));
    }

    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", amount.trim()))?;

    Ok((category.to_string(), amount))
}

#[derive(Subcommand)]
pub enum AiAction {
    /// Show the resolved backend and check that it responds
    Test {
        /// Model to test instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., suggest_budget_adjustments)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
