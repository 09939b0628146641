//! Server command implementation

use std::path::Path;

use anyhow::Result;
use spendwise_core::Config;
use spendwise_server::ServerConfig;

pub async fn cmd_serve(
    config: Config,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting SpendWise web server...");
    println!("   Listening: http://{}:{}", host, port);
    println!("   AI backend: {} ({})", config.ai.host, config.ai.backend.as_str());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // Comma-separated extra CORS origins
    let allowed_origins: Vec<String> = std::env::var("SPENDWISE_CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let static_dir = static_dir.map(|d| d.to_string_lossy().into_owned());
    spendwise_server::serve_with_config(
        config,
        host,
        port,
        static_dir.as_deref(),
        ServerConfig { allowed_origins },
    )
    .await
}
