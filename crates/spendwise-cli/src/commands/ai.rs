//! AI backend command implementations

use anyhow::Result;
use spendwise_core::{AIBackend, AdvisoryRequest, Config};

use super::build_pipeline;

/// Show the resolved backend, check it responds, and run one sample request
pub async fn cmd_ai_test(config: &Config, model: Option<&str>) -> Result<()> {
    println!("🔍 Testing AI backend...\n");

    let pipeline = build_pipeline(config, model)?;
    let backend = pipeline.backend();

    println!("  Backend: {}", backend.kind());
    println!("  Host:    {}", backend.host());
    println!("  Model:   {}", backend.model());
    println!("  Timeout: {}s\n", config.ai.timeout.as_secs());

    print!("Checking availability... ");
    if !backend.health_check().await {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {}", backend.host());
        println!("\nTo set up Ollama:");
        println!("  1. Install Ollama: https://ollama.ai/download");
        println!("  2. Start the server: ollama serve");
        println!("  3. Pull the model: ollama pull {}", backend.model());
        println!("  4. Set environment variable: export OLLAMA_HOST={}", backend.host());
        return Ok(());
    }
    println!("✅ Connected");

    println!("\n📋 Sample suggestion request...\n");
    let sample = AdvisoryRequest::new(3000.0)
        .with_expense("Food", 650.0)
        .with_expense("Entertainment", 220.0)
        .with_expense("Housing", 1200.0)
        .with_goal("Food", 450.0)
        .with_goal("Entertainment", 100.0);

    match pipeline.get_suggestions(&sample).await {
        Ok(response) if response.is_empty() => {
            println!("  ⚠️  Model replied but produced no usable suggestions");
        }
        Ok(response) => {
            for (category, suggestion) in &response.suggestions {
                println!("  {} → {}", category, suggestion);
            }
        }
        Err(e) => println!("  ❌ Error: {}", e),
    }

    Ok(())
}
