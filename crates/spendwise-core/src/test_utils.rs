//! Test utilities for spendwise-core
//!
//! This module provides a mock Ollama server for development and
//! integration tests. It records every generate request it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// What the mock server answers on `/api/generate`
#[derive(Debug, Clone)]
pub enum MockGenerate {
    /// 200 with this string as the `response` field
    Reply(String),
    /// Bare status code with an error body
    Status(u16),
}

#[derive(Clone)]
struct MockState {
    generate: MockGenerate,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server with a canned suggestions reply
    pub async fn start() -> Self {
        Self::start_with(MockGenerate::Reply(
            json!({"suggestions": {"Food": "Cook at home twice more per week."}}).to_string(),
        ))
        .await
    }

    /// Start the mock server replying with this raw model text
    pub async fn start_with_reply(reply: impl Into<String>) -> Self {
        Self::start_with(MockGenerate::Reply(reply.into())).await
    }

    /// Start the mock server on an available port
    pub async fn start_with(generate: MockGenerate) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            generate,
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock Ollama server");
        let addr = listener.local_addr().expect("mock server address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request bodies received on `/api/generate`, oldest first
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<Value> {
    Json(json!({
        "models": [{
            "name": "llama3.2:latest",
            "modified_at": "2024-01-01T00:00:00Z",
            "size": 4_000_000_000u64
        }]
    }))
}

/// Ollama generate endpoint
async fn handle_generate(State(state): State<MockState>, Json(request): Json<Value>) -> Response {
    let model = request["model"].as_str().unwrap_or("llama3.2").to_string();
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(request);
    }

    match state.generate {
        MockGenerate::Reply(response) => Json(json!({
            "model": model,
            "response": response,
            "done": true
        }))
        .into_response(),
        MockGenerate::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({"error": "mock failure"}))).into_response()
        }
    }
}
