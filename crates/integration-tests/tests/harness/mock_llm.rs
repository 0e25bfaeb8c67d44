//! Mock ShengSuanYun router for integration tests
//!
//! Serves `/api/v1/chat/completions` (JSON or SSE) and `/api/v1/models`,
//! recording every request it receives.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::config::TEST_API_KEY;

/// Arguments of the tool call the mock streams, split into fragments
pub const TOOL_ARGUMENT_FRAGMENTS: [&str; 4] = ["{\"loc", "ation\":\"Hang", "zhou\",\"unit\"", ":\"celsius\"}"];

/// Content sent after `[DONE]`, which clients must never surface
pub const AFTER_DONE: &str = "AFTER DONE";

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub body: Value,
}

/// Mock backend returning predictable responses
pub struct MockLlm {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockLlmState>,
}

struct MockLlmState {
    /// Number of chat requests to fail before succeeding
    fail_count: AtomicU32,
    fail_status: StatusCode,
    response_content: String,
    /// Size of the body chunks a stream is written in
    stream_chunk_size: usize,
    /// Pause before each event when set; events are then written whole
    event_delay: Option<Duration>,
    models: Value,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Configures a [`MockLlm`] before it starts
pub struct MockLlmBuilder {
    fail_count: u32,
    fail_status: StatusCode,
    response_content: String,
    stream_chunk_size: usize,
    event_delay: Option<Duration>,
    models: Value,
}

impl MockLlmBuilder {
    /// Fail the first `n` chat requests with `status`
    pub fn failing(mut self, n: u32, status: StatusCode) -> Self {
        self.fail_count = n;
        self.fail_status = status;
        self
    }

    /// Reply with `content` instead of the default text
    pub fn with_response(mut self, content: &str) -> Self {
        content.clone_into(&mut self.response_content);
        self
    }

    /// Write stream bodies in chunks of `size` bytes
    pub fn with_stream_chunk_size(mut self, size: usize) -> Self {
        self.stream_chunk_size = size.max(1);
        self
    }

    /// Write one event at a time, pausing `delay` before each
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }

    /// Serve `body` from the model catalogue endpoint
    pub fn with_models(mut self, body: Value) -> Self {
        self.models = body;
        self
    }

    /// Start the mock server, returning once it is listening
    pub async fn start(self) -> anyhow::Result<MockLlm> {
        let state = Arc::new(MockLlmState {
            fail_count: AtomicU32::new(self.fail_count),
            fail_status: self.fail_status,
            response_content: self.response_content,
            stream_chunk_size: self.stream_chunk_size,
            event_delay: self.event_delay,
            models: self.models,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/v1/chat/completions", routing::post(handle_chat_completions))
            .route("/api/v1/models", routing::get(handle_models))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockLlm { addr, shutdown, state })
    }
}

impl MockLlm {
    pub fn builder() -> MockLlmBuilder {
        MockLlmBuilder {
            fail_count: 0,
            fail_status: StatusCode::INTERNAL_SERVER_ERROR,
            response_content: "Hello from mock LLM".to_owned(),
            stream_chunk_size: 7,
            event_delay: None,
            models: default_models(),
        }
    }

    /// Start a mock server with default behavior
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    /// API root to configure as the base URL
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("request log poisoned").clone()
    }

    /// Number of chat-completion requests received
    pub fn completion_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.path.ends_with("/chat/completions"))
            .count()
    }
}

impl Drop for MockLlm {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn default_models() -> Value {
    json!({
        "data": [
            {
                "id": "mock/model-2",
                "name": "Mock Model Two",
                "description": "A second mock model with a much longer description that still gets cut short once the pricing suffix is appended to it.",
                "context_length": 32_768,
                "pricing": {"prompt": "0.5", "completion": "1"}
            },
            {
                "id": "mock/model-1",
                "name": "Mock Model One",
                "description": "Short.",
                "context_length": 8192,
                "pricing": {"prompt": "0", "completion": "0"}
            },
            {
                "id": "mock/unnamed",
                "name": "",
                "pricing": {"prompt": "0", "completion": "0"}
            }
        ]
    })
}

fn record(state: &MockLlmState, path: &str, headers: &HeaderMap, body: Value) {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    state.requests.lock().expect("request log poisoned").push(RecordedRequest {
        path: path.to_owned(),
        authorization: header_value("authorization"),
        referer: header_value("http-referer"),
        title: header_value("x-title"),
        body,
    });
}

fn is_authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TEST_API_KEY}"))
}

fn error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"error": {"type": error_type, "message": message}})),
    )
        .into_response()
}

// -- Handlers --

async fn handle_models(State(state): State<Arc<MockLlmState>>, headers: HeaderMap) -> Response {
    record(&state, "/api/v1/models", &headers, Value::Null);

    if headers.contains_key(header::AUTHORIZATION) && !is_authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "authentication_error", "invalid api key");
    }

    Json(state.models.clone()).into_response()
}

async fn handle_chat_completions(
    State(state): State<Arc<MockLlmState>>,
    headers: HeaderMap,
    Json(req): Json<Value>,
) -> Response {
    record(&state, "/api/v1/chat/completions", &headers, req.clone());

    if !is_authorized(&headers) {
        return error_response(StatusCode::UNAUTHORIZED, "authentication_error", "invalid api key");
    }

    let remaining = state.fail_count.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return error_response(state.fail_status, "server_error", "mock server intentional failure");
    }

    let model = req["model"].as_str().unwrap_or_default().to_owned();
    let has_tools = req["tools"].as_array().is_some_and(|tools| !tools.is_empty());

    if req["stream"].as_bool().unwrap_or(false) {
        return streaming_response(&state, &model, has_tools);
    }

    let message = if has_tools {
        json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_test_123",
                "type": "function",
                "function": {"name": "get_weather", "arguments": TOOL_ARGUMENT_FRAGMENTS.concat()}
            }]
        })
    } else {
        json!({"role": "assistant", "content": state.response_content})
    };

    Json(json!({
        "id": "chatcmpl-test-123",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": if has_tools { "tool_calls" } else { "stop" }
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }))
    .into_response()
}

/// Format one SSE data line
pub fn sse_event(value: &Value) -> String {
    format!("data: {value}\n\n")
}

fn chunk(model: &str, delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-test-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": model,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

/// Full SSE body: content split into words, or a fragmented tool call,
/// with a keepalive, a malformed event, a usage-only event and trailing
/// bytes after `[DONE]`
pub fn stream_body(model: &str, content: &str, has_tools: bool) -> String {
    let mut body = String::from(": keepalive\n\n");
    body.push_str(&sse_event(&chunk(model, json!({"role": "assistant", "content": ""}), None)));

    if has_tools {
        body.push_str(&sse_event(&chunk(
            model,
            json!({"tool_calls": [{
                "index": 0,
                "id": "call_test_stream",
                "type": "function",
                "function": {"name": "get_weather", "arguments": ""}
            }]}),
            None,
        )));
        body.push_str("data: {\"choices\": [{\"delta\": \n\n");
        for fragment in TOOL_ARGUMENT_FRAGMENTS {
            body.push_str(&sse_event(&chunk(
                model,
                json!({"tool_calls": [{"index": 0, "function": {"arguments": fragment}}]}),
                None,
            )));
        }
    } else {
        for (i, word) in content.split_inclusive(' ').enumerate() {
            if i == 1 {
                body.push_str("data: {not json}\n\n");
            }
            body.push_str(&sse_event(&chunk(model, json!({"content": word}), None)));
        }
    }

    let finish_reason = if has_tools { "tool_calls" } else { "stop" };
    body.push_str(&sse_event(&chunk(model, json!({}), Some(finish_reason))));
    body.push_str(&sse_event(&json!({
        "id": "chatcmpl-test-stream",
        "choices": [],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })));
    body.push_str("data: [DONE]\n\n");
    body.push_str(&sse_event(&chunk(model, json!({"content": AFTER_DONE}), None)));
    body
}

fn streaming_response(state: &MockLlmState, model: &str, has_tools: bool) -> Response {
    let body = stream_body(model, &state.response_content, has_tools);

    let body = match state.event_delay {
        Some(delay) => {
            let events: Vec<Bytes> = body
                .split_inclusive("\n\n")
                .map(|event| Bytes::copy_from_slice(event.as_bytes()))
                .collect();
            Body::from_stream(futures::stream::iter(events).then(move |event| async move {
                tokio::time::sleep(delay).await;
                Ok::<_, Infallible>(event)
            }))
        }
        None => {
            let chunks: Vec<Result<Bytes, Infallible>> = body
                .as_bytes()
                .chunks(state.stream_chunk_size)
                .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
                .collect();
            Body::from_stream(futures::stream::iter(chunks))
        }
    };

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}
