//! Test utilities for fluxo-core
//!
//! This module provides a mock OpenAI-compatible classification server used
//! by pipeline tests. It answers `/v1/chat/completions` with canned
//! keyword-based classifications and can be started in failure modes that
//! exercise the degradation paths.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// How the mock server answers classification requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockAiMode {
    /// Keyword-based classification, strict JSON
    #[default]
    Normal,
    /// Valid JSON wrapped in prose (exercises brace recovery)
    Wrapped,
    /// Unparseable body (exercises chunk-level fallback)
    Malformed,
    /// Drops the first item from every response (exercises coverage repair)
    OmitFirst,
}

/// Mock classification server for testing
pub struct MockAiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockAiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with_mode(MockAiMode::Normal).await
    }

    /// Start the mock server in a specific answer mode
    pub async fn start_with_mode(mode: MockAiMode) -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route(
                "/v1/chat/completions",
                post(move |Json(request): Json<Value>| async move {
                    handle_chat(request, mode)
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockAiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Models endpoint (health check)
async fn handle_models() -> Json<Value> {
    Json(json!({ "object": "list", "data": [{ "id": "test-model" }] }))
}

/// Chat-completions endpoint
fn handle_chat(request: Value, mode: MockAiMode) -> Json<Value> {
    let content = match mode {
        MockAiMode::Malformed => "I could not produce any structured output, sorry.".to_string(),
        _ => {
            let items = extract_request_items(&request);
            let mut results: Vec<Value> = items.iter().map(classify_item).collect();
            if mode == MockAiMode::OmitFirst && !results.is_empty() {
                results.remove(0);
            }
            let body = json!({ "items": results }).to_string();
            match mode {
                MockAiMode::Wrapped => {
                    format!("Here is the classification:\n{}\nDone.", body)
                }
                _ => body,
            }
        }
    };

    Json(json!({
        "id": "mock-completion",
        "object": "chat.completion",
        "model": request["model"],
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

/// Pull the JSON array of transactions out of the user message
fn extract_request_items(request: &Value) -> Vec<Value> {
    let content = request["messages"]
        .as_array()
        .and_then(|messages| messages.iter().find(|m| m["role"] == "user"))
        .and_then(|m| m["content"].as_str())
        .unwrap_or("");

    // The prompt carries the transactions as the first JSON array and then a
    // trailing `{"items":[...]}` format example. Scan for the first balanced
    // bracket pair so the example's brackets don't extend the slice.
    let (start, end) = match first_balanced_array(content) {
        Some(span) => span,
        None => return Vec::new(),
    };

    serde_json::from_str(&content[start..=end]).unwrap_or_default()
}

/// Find the byte span of the first balanced `[...]` array, ignoring brackets
/// inside double-quoted strings.
fn first_balanced_array(content: &str) -> Option<(usize, usize)> {
    let start = content.find('[')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((start, start + offset));
                }
            }
            _ => {}
        }
    }
    None
}

/// Keyword classification mirroring what a small model would answer
fn classify_item(item: &Value) -> Value {
    let id = item["id"].as_str().unwrap_or("");
    let text = format!(
        "{} {}",
        item["title"].as_str().unwrap_or(""),
        item["description"].as_str().unwrap_or("")
    )
    .to_lowercase();
    let amount = item["amount"].as_f64().unwrap_or(0.0);

    let (category, confidence) = if text.contains("netflix") {
        ("Streaming", 0.95)
    } else if text.contains("posto") || text.contains("uber") {
        ("Transporte", 0.9)
    } else if text.contains("salario") || text.contains("salário") {
        ("Entradas", 0.9)
    } else if text.contains("mercado") {
        ("Mercado", 0.85)
    } else if text.contains("clampme") {
        // deliberately out-of-range confidence
        ("Mercado", 1.5)
    } else {
        ("Outros", 0.4)
    };

    let direction = if amount >= 0.0 { "income" } else { "expense" };

    json!({
        "id": id,
        "category": category,
        "type": direction,
        "confidence": confidence
    })
}
