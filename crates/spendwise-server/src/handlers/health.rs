//! Health and catalog handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use spendwise_core::{AIBackend, Category};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ai: AiStatus,
}

#[derive(Debug, Serialize)]
pub struct AiStatus {
    pub configured: bool,
    pub available: bool,
    pub backend: String,
    pub host: String,
    pub model: String,
}

/// GET /api/health - Server and AI backend status
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ai = match state.advisor {
        Some(ref advisor) => {
            let info = advisor.backend().info();
            AiStatus {
                configured: true,
                available: advisor.backend().health_check().await,
                backend: info.kind,
                host: info.host,
                model: info.model,
            }
        }
        None => AiStatus {
            configured: false,
            available: false,
            backend: state.config.ai.backend.as_str().to_string(),
            host: state.config.ai.host.clone(),
            model: state.config.ai.model.clone(),
        },
    };

    Json(HealthResponse { status: "ok", ai })
}

/// GET /api/categories - Category catalog
pub async fn list_categories() -> Json<&'static [Category]> {
    Json(Category::all())
}
