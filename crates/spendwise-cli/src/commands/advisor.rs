//! Advisor command implementations

use std::fs;

use anyhow::{bail, Context, Result};
use spendwise_core::budget::format_currency;
use spendwise_core::{AIBackend, AIClient, AdvisoryPipeline, AdvisoryRequest, Config, PromptLibrary};

use crate::cli::RequestArgs;

/// Build a request from `--input FILE` or the individual flags
///
/// `--language` and `--context` override whatever the file says.
pub fn build_request(args: &RequestArgs) -> Result<AdvisoryRequest> {
    let mut request = match args.input {
        Some(ref path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            AdvisoryRequest::from_json(value)?
        }
        None => {
            let Some(income) = args.income else {
                bail!("Provide --income (or --input FILE)");
            };
            let mut request = AdvisoryRequest::new(income);
            for (category, amount) in &args.expenses {
                request = request.with_expense(category, *amount);
            }
            for (category, amount) in &args.goals {
                request = request.with_goal(category, *amount);
            }
            request
        }
    };

    if let Some(ref language) = args.language {
        request.language = Some(language.clone());
    }
    if let Some(ref context) = args.context {
        request.financial_context = Some(context.clone());
    }

    Ok(request)
}

/// Build the advisory pipeline from config
pub fn build_pipeline(config: &Config, model: Option<&str>) -> Result<AdvisoryPipeline> {
    let mut client = AIClient::from_config(&config.ai)?;
    if let Some(model) = model {
        client = client.with_model(model);
    }

    let pipeline = AdvisoryPipeline::from_library(client, &mut PromptLibrary::new())?
        .with_default_language(&config.default_language);
    Ok(pipeline)
}

/// Print the rendered prompt without calling the model
pub fn cmd_prompt(config: &Config, args: &RequestArgs) -> Result<()> {
    let request = build_request(args)?;
    let pipeline = build_pipeline(config, None)?;
    println!("{}", pipeline.render_prompt(&request)?);
    Ok(())
}

/// Ask the model for suggestions and print them
pub async fn cmd_suggest(
    config: &Config,
    args: &RequestArgs,
    json: bool,
    model: Option<&str>,
) -> Result<()> {
    let request = build_request(args)?;
    let pipeline = build_pipeline(config, model)?;

    if !json {
        println!(
            "💡 Asking {} ({}) for suggestions on {} income...\n",
            pipeline.backend().model(),
            pipeline.backend().kind(),
            format_currency(request.income, &config.default_currency)
        );
    }

    let response = pipeline
        .get_suggestions(&request)
        .await
        .with_context(|| format!("AI backend at {} failed", pipeline.backend().host()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.is_empty() {
        println!("No suggestions available.");
        return Ok(());
    }

    let width = response
        .suggestions
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);
    for (category, suggestion) in &response.suggestions {
        println!("  {:<width$}  {}", category, suggestion, width = width);
    }

    Ok(())
}
