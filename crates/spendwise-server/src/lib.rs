//! SpendWise Web Server
//!
//! Axum-based REST API exposing the budget advisor and budget reports.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Security response headers (CSP, nosniff, frame denial)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use spendwise_core::{AIBackend, AIClient, AdvisoryPipeline, Config, PromptLibrary};

mod handlers;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    /// None when the AI backend could not be set up
    pub advisor: Option<AdvisoryPipeline>,
}

/// Create the application router, building the advisor from `config`
pub fn create_router(config: Config, static_dir: Option<&str>, server: ServerConfig) -> Router {
    let advisor = build_advisor(&config);
    create_router_with_advisor(config, advisor, static_dir, server)
}

/// Create the application router with an explicit advisor (for testing)
pub fn create_router_with_advisor(
    config: Config,
    advisor: Option<AdvisoryPipeline>,
    static_dir: Option<&str>,
    server: ServerConfig,
) -> Router {
    let state = Arc::new(AppState { config, advisor });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/categories", get(handlers::list_categories))
        // Advisor
        .route("/suggestions", post(handlers::get_suggestions))
        .route(
            "/suggestions/snapshot",
            post(handlers::get_snapshot_suggestions),
        )
        // Reports
        .route(
            "/reports/budget-progress",
            post(handlers::report_budget_progress),
        )
        .route("/reports/spending", post(handlers::report_spending));

    // Build CORS layer
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if server.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let origins: Vec<HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-ancestors 'none'",
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Build the advisory pipeline, or log why AI features are off
fn build_advisor(config: &Config) -> Option<AdvisoryPipeline> {
    let client = match AIClient::from_config(&config.ai) {
        Ok(client) => client,
        Err(e) => {
            warn!("⚠️  AI backend could not be created: {}", e);
            return None;
        }
    };

    match AdvisoryPipeline::from_library(client, &mut PromptLibrary::new()) {
        Ok(pipeline) => {
            info!(
                "AI backend configured: {} {} (model: {})",
                pipeline.backend().kind(),
                pipeline.backend().host(),
                pipeline.backend().model()
            );
            Some(pipeline.with_default_language(&config.default_language))
        }
        Err(e) => {
            warn!("⚠️  Advisory prompt could not be loaded: {}", e);
            None
        }
    }
}

/// Start the server
pub async fn serve(
    config: Config,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    serve_with_config(config, host, port, static_dir, ServerConfig::default()).await
}

/// Start the server with custom server configuration
pub async fn serve_with_config(
    config: Config,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    server: ServerConfig,
) -> anyhow::Result<()> {
    let advisor = build_advisor(&config);
    if let Some(ref pipeline) = advisor {
        check_ai_connection(pipeline.backend()).await;
    }

    let app = create_router_with_advisor(config, advisor, static_dir, server);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(client: &AIClient) {
    if client.health_check().await {
        info!(
            "✅ AI backend connected: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        warn!(
            "⚠️  AI backend configured but not responding: {} (model: {})",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn bad_gateway(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_GATEWAY, msg)
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    /// Unreadable JSON body (bad syntax, wrong shape, wrong content type)
    pub fn from_rejection(rejection: JsonRejection) -> Self {
        Self::with_status(rejection.status(), &rejection.body_text())
    }

    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
