mod common;

use std::time::Duration;

use axum::http::StatusCode;
use ollama_playground::{
    ChatOptions, LanguageModel, Message, OllamaClient, PlaygroundError, RetryPolicy,
};
use serde_json::json;

use common::MockState;

#[tokio::test]
async fn lists_models_and_skips_nameless_entries() {
    let state = MockState::with_tags(json!({
        "models": [
            {"name": "llama3.2:latest", "size": 2019393189u64, "digest": "a80c4f17acd5"},
            {"model": "no-name"},
            {"name": "deepseek-r1:8b"}
        ]
    }));
    let base = common::spawn(state).await;
    let client = OllamaClient::new().unwrap().with_host(&base);

    let models = client.list_models().await.unwrap();

    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["llama3.2:latest", "deepseek-r1:8b"]);
    assert_eq!(models[0].size, Some(2019393189));
}

#[tokio::test]
async fn missing_models_key_means_no_models() {
    let base = common::spawn(MockState::with_tags(json!({}))).await;
    let client = OllamaClient::new().unwrap().with_host(&base);

    assert!(client.list_models().await.unwrap().is_empty());
}

#[tokio::test]
async fn chat_sends_history_and_returns_content() {
    let state = MockState::default();
    state.push_reply("<think>hmm</think>J'adore la programmation.");
    let base = common::spawn(state.clone()).await;
    let client = OllamaClient::new()
        .unwrap()
        .with_host(&base)
        .with_model("llama3.2:latest");

    let reply = client
        .complete_chat(
            &[
                Message::system("Translate the user sentence to French."),
                Message::user("I love programming."),
            ],
            &ChatOptions::default().with_temperature(0.0),
        )
        .await
        .unwrap();

    assert_eq!(reply, "J'adore la programmation.");
    let requests = state.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        json!({
            "model": "llama3.2:latest",
            "messages": [
                {"role": "system", "content": "Translate the user sentence to French."},
                {"role": "user", "content": "I love programming."}
            ],
            "stream": false,
            "options": {"temperature": 0.0}
        })
    );
}

#[tokio::test]
async fn missing_model_is_a_connectivity_error() {
    let state = MockState::default();
    state.push_raw(
        StatusCode::NOT_FOUND,
        json!({"error": "model \"llama3.2:latest\" not found, try pulling it first"}),
    );
    let base = common::spawn(state).await;
    let client = OllamaClient::new().unwrap().with_host(&base);

    let err = client
        .complete_chat(&[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, PlaygroundError::ModelServer { status: 404, .. }));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = OllamaClient::new()
        .unwrap()
        .with_host(format!("http://{addr}"));

    let err = client.list_models().await.unwrap_err();
    assert!(matches!(err, PlaygroundError::Unreachable { .. }), "{err:?}");
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn retries_transient_server_errors() {
    let state = MockState::default();
    state.push_raw(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "loading model"}));
    state.push_reply("ready");
    let base = common::spawn(state.clone()).await;
    let client = OllamaClient::new()
        .unwrap()
        .with_host(&base)
        .with_retry(RetryPolicy::new(1, Duration::from_millis(1)));

    let reply = client
        .complete_chat(&[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap();

    assert_eq!(reply, "ready");
    assert_eq!(state.requests().len(), 2);
}

#[tokio::test]
async fn server_error_field_is_surfaced() {
    let state = MockState::default();
    state.push_raw(StatusCode::OK, json!({"error": "context window exceeded"}));
    let base = common::spawn(state).await;
    let client = OllamaClient::new().unwrap().with_host(&base);

    let err = client
        .complete_chat(&[Message::user("hi")], &ChatOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("context window exceeded"));
}
