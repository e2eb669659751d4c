//! In-process stand-in for the Ollama HTTP API.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

#[derive(Clone, Default)]
pub struct MockState {
    /// Replies served by `/api/chat`, in order: `(status, body)`.
    pub chat_replies: Arc<Mutex<VecDeque<(StatusCode, Value)>>>,
    pub chat_requests: Arc<Mutex<Vec<Value>>>,
    pub tags: Arc<Mutex<Value>>,
}

impl MockState {
    pub fn with_tags(tags: Value) -> Self {
        let state = Self::default();
        *state.tags.lock().unwrap() = tags;
        state
    }

    pub fn push_reply(&self, content: &str) {
        self.push_raw(
            StatusCode::OK,
            json!({
                "model": "llama3.2:latest",
                "message": {"role": "assistant", "content": content},
                "done": true
            }),
        );
    }

    pub fn push_raw(&self, status: StatusCode, body: Value) {
        self.chat_replies.lock().unwrap().push_back((status, body));
    }

    pub fn requests(&self) -> Vec<Value> {
        self.chat_requests.lock().unwrap().clone()
    }
}

async fn tags(State(state): State<MockState>) -> Json<Value> {
    Json(state.tags.lock().unwrap().clone())
}

async fn chat(State(state): State<MockState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.chat_requests.lock().unwrap().push(body);
    let reply = state.chat_replies.lock().unwrap().pop_front();
    match reply {
        Some((status, body)) => (status, Json(body)),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "no scripted reply"})),
        ),
    }
}

/// Serve the mock on an ephemeral port and return its base URL.
pub async fn spawn(state: MockState) -> String {
    let app = Router::new()
        .route("/api/tags", get(tags))
        .route("/api/chat", post(chat))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
