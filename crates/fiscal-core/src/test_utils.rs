//! Test utilities for fiscal-core
//!
//! A mock model server speaking the Gemini, OpenAI-compatible and Ollama
//! wire formats, with configurable latency and failures.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

struct MockState {
    reply: String,
    empty: bool,
    delay: Duration,
    failures_left: AtomicUsize,
    fail_status: StatusCode,
    requests: AtomicUsize,
    last_body: Mutex<Option<Value>>,
    last_api_key: Mutex<Option<String>>,
}

/// Builder for [`MockModelServer`]
pub struct MockModelServerBuilder {
    reply: String,
    empty: bool,
    delay: Duration,
    fail_times: usize,
    fail_status: u16,
}

impl MockModelServerBuilder {
    /// Text every completion returns
    pub fn reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    /// Answer successfully but with no text (no candidates / choices)
    pub fn empty(mut self) -> Self {
        self.empty = true;
        self
    }

    /// Sleep before answering each completion
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first `times` completions with `status`
    pub fn fail_times(mut self, times: usize, status: u16) -> Self {
        self.fail_times = times;
        self.fail_status = status;
        self
    }

    pub async fn start(self) -> MockModelServer {
        let state = Arc::new(MockState {
            reply: self.reply,
            empty: self.empty,
            delay: self.delay,
            failures_left: AtomicUsize::new(self.fail_times),
            fail_status: StatusCode::from_u16(self.fail_status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            requests: AtomicUsize::new(0),
            last_body: Mutex::new(None),
            last_api_key: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1beta/models/:call", post(handle_gemini).get(handle_ok))
            .route("/v1/chat/completions", post(handle_openai))
            .route("/v1/models", get(handle_ok))
            .route("/api/generate", post(handle_ollama))
            .route("/api/tags", get(handle_ok))
            .with_state(state.clone());

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

        MockModelServer {
            addr,
            shutdown_tx: Some(shutdown_tx),
            state,
        }
    }
}

/// Mock model server for tests
pub struct MockModelServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    state: Arc<MockState>,
}

impl MockModelServer {
    pub fn builder() -> MockModelServerBuilder {
        MockModelServerBuilder {
            reply: "Mock model answer".to_string(),
            empty: false,
            delay: Duration::ZERO,
            fail_times: 0,
            fail_status: 500,
        }
    }

    /// Start with default settings
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion requests received so far, including failed ones
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// JSON body of the most recent completion request
    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    /// `x-goog-api-key` header of the most recent Gemini request
    pub fn last_api_key(&self) -> Option<String> {
        self.state.last_api_key.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockModelServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_ok() -> StatusCode {
    StatusCode::OK
}

/// Shared request bookkeeping; `Err` carries the failure response
async fn record(state: &MockState, body: Value) -> Result<(), Response> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = Some(body);

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let failing = state
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return Err((state.fail_status, "mock failure").into_response());
    }
    Ok(())
}

async fn handle_gemini(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    *state.last_api_key.lock().unwrap() = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if let Err(resp) = record(&state, body).await {
        return resp;
    }
    if state.empty {
        return Json(json!({ "candidates": [] })).into_response();
    }
    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": state.reply }] }
        }]
    }))
    .into_response()
}

async fn handle_openai(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    if let Err(resp) = record(&state, body).await {
        return resp;
    }
    if state.empty {
        return Json(json!({ "choices": [] })).into_response();
    }
    Json(json!({
        "choices": [{
            "message": { "role": "assistant", "content": state.reply }
        }]
    }))
    .into_response()
}

async fn handle_ollama(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let model = body["model"].clone();
    if let Err(resp) = record(&state, body).await {
        return resp;
    }
    let reply = if state.empty { "" } else { state.reply.as_str() };
    Json(json!({ "model": model, "response": reply, "done": true })).into_response()
}
