//! Chat model abstraction and the Ollama HTTP client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::{normalize_host, AppConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::error::{PlaygroundError, Result};
use crate::message::Message;
use crate::telemetry::RetryPolicy;

/// Per-call sampling options. Unset fields fall back to the client defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f64>,
    pub stop: Vec<String>,
}

impl ChatOptions {
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }
}

/// Minimal abstraction around a chat completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete_chat(&self, messages: &[Message], options: &ChatOptions) -> Result<String>;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn complete_chat(&self, messages: &[Message], options: &ChatOptions) -> Result<String> {
        (**self).complete_chat(messages, options).await
    }
}

/// A model installed on the server, as reported by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
}

/// Ollama client for local LLM inference.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    model: String,
    base_url: String,
    temperature: Option<f64>,
    retry: RetryPolicy,
}

impl OllamaClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: build_http(Duration::from_secs(300))?,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: None,
            retry: RetryPolicy::none(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(Duration::from_secs(cfg.server.timeout_secs))?,
            model: cfg.model.name.clone(),
            base_url: normalize_host(&cfg.server.base_url),
            temperature: cfg.model.temperature,
            retry: RetryPolicy::new(
                cfg.server.max_retries,
                Duration::from_millis(cfg.server.retry_backoff_ms),
            ),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.base_url = normalize_host(host.as_ref());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = build_http(timeout)?;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the models installed on the server. Entries without a name are skipped.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);
        debug!(%url, "listing models");
        let http = &self.http;
        let url = url.as_str();
        let body: TagsResponse = self
            .retry
            .retry("list_models", move |_| async move {
                let resp = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|err| request_error(url, err))?;
                let resp = check_status(resp).await?;
                resp.json::<TagsResponse>().await.map_err(|err| {
                    PlaygroundError::LanguageModel(format!("Ollama tags parse error: {err}"))
                })
            })
            .await?;

        Ok(body
            .models
            .into_iter()
            .filter_map(|raw| {
                Some(ModelInfo {
                    name: raw.name?,
                    size: raw.size,
                    modified_at: raw.modified_at,
                    digest: raw.digest,
                })
            })
            .collect())
    }

    fn chat_body(&self, messages: &[Message], options: &ChatOptions) -> Value {
        let mut model_options = Map::new();
        if let Some(temperature) = options.temperature.or(self.temperature) {
            model_options.insert("temperature".into(), json!(temperature));
        }
        if !options.stop.is_empty() {
            model_options.insert("stop".into(), json!(options.stop));
        }

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        if !model_options.is_empty() {
            body["options"] = Value::Object(model_options);
        }
        body
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete_chat(&self, messages: &[Message], options: &ChatOptions) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.chat_body(messages, options);
        debug!(model = %self.model, messages = messages.len(), "sending chat request");

        let http = &self.http;
        let url = url.as_str();
        let body = &body;
        let parsed: ChatResponse = self
            .retry
            .retry("complete_chat", move |_| async move {
                let resp = http
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|err| request_error(url, err))?;
                let resp = check_status(resp).await?;
                resp.json::<ChatResponse>().await.map_err(|err| {
                    PlaygroundError::LanguageModel(format!("Ollama chat parse error: {err}"))
                })
            })
            .await?;

        if let Some(error) = parsed.error {
            return Err(PlaygroundError::LanguageModel(error));
        }
        let content = parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| PlaygroundError::LanguageModel("Ollama returned no message".into()))?;
        Ok(strip_think_blocks(&content))
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| PlaygroundError::LanguageModel(format!("http client error: {err}")))
}

fn request_error(url: &str, err: reqwest::Error) -> PlaygroundError {
    if err.is_connect() || err.is_timeout() {
        PlaygroundError::Unreachable {
            url: url.to_string(),
            source: err,
        }
    } else {
        PlaygroundError::LanguageModel(format!("Ollama request failed: {err}"))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(PlaygroundError::ModelServer {
        status: status.as_u16(),
        body,
    })
}

/// Reasoning models wrap their deliberation in `<think>` tags; callers only want the answer.
pub fn strip_think_blocks(text: &str) -> String {
    static THINK: OnceLock<Regex> = OnceLock::new();
    let re = THINK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>\s*").expect("valid regex"));
    re.replace_all(text, "").into_owned()
}

/// A deterministic model used for tests and demos.
///
/// Replies are served in order. When a call carries stop sequences the reply
/// is cut at the first one, as a real server would.
pub struct StubModel {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(Vec<Message>, ChatOptions)>>,
}

impl StubModel {
    pub fn new(responses: Vec<String>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every `(messages, options)` pair the stub has been called with.
    pub fn calls(&self) -> Vec<(Vec<Message>, ChatOptions)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete_chat(&self, messages: &[Message], options: &ChatOptions) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((messages.to_vec(), options.clone()));
        }
        let raw = self
            .responses
            .lock()
            .map_err(|_| PlaygroundError::LanguageModel("StubModel poisoned".into()))?
            .pop_front()
            .ok_or_else(|| {
                PlaygroundError::LanguageModel("StubModel ran out of scripted responses".into())
            })?;

        let cut = options
            .stop
            .iter()
            .filter_map(|stop| raw.find(stop.as_str()))
            .min()
            .unwrap_or(raw.len());
        Ok(raw[..cut].to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<RawModel>,
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    modified_at: Option<String>,
    #[serde(default)]
    digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    error: Option<String>,
}
