//! SpendWise CLI - Budget suggestions from a local model
//!
//! Usage:
//!   spendwise suggest --income 3000 -e Food=420 -g Food=400   Get suggestions
//!   spendwise prompt --input snapshot.json                     Show the rendered prompt
//!   spendwise ai test                                          Check the AI backend
//!   spendwise serve --port 3000                                Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use spendwise_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Suggest {
            request,
            json,
            model,
        } => commands::cmd_suggest(&config, &request, json, model.as_deref()).await,
        Commands::Prompt { request } => commands::cmd_prompt(&config, &request),
        Commands::Ai { action } => match action {
            AiAction::Test { model } => commands::cmd_ai_test(&config, model.as_deref()).await,
        },
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Serve {
            port,
            host,
            static_dir,
        } => commands::cmd_serve(config, &host, port, static_dir.as_deref()).await,
    }
}
