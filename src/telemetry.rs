//! Logging setup and retry handling for calls to the model server.

use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{PlaygroundError, Result};

const DEFAULT_FILTER: &str = "ollama_playground=info,playground=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber. Logs go to stderr so stdout only carries transcripts.
///
/// Calling this twice is harmless: the second install is ignored.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    if let Err(err) = result {
        eprintln!("tracing already initialized: {err}");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(200),
        }
    }

    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Retry `f` while it fails with a retryable error, backing off linearly.
    pub async fn retry<F, Fut, T>(&self, context: &str, mut f: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        for attempt in 0..=self.max_retries {
            match f(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt == self.max_retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    warn!(context, attempt, error = %err, "retrying model server call");
                    sleep(self.backoff * (attempt + 1)).await;
                }
            }
        }
        Err(PlaygroundError::Protocol("retry exhausted".into()))
    }
}

fn is_retryable(err: &PlaygroundError) -> bool {
    match err {
        PlaygroundError::Unreachable { .. } => true,
        PlaygroundError::ModelServer { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = Arc::new(Mutex::new(0u32));

        let res = policy
            .retry("test", |_: u32| {
                let calls = calls.clone();
                async move {
                    let mut guard = calls.lock().await;
                    *guard += 1;
                    if *guard < 2 {
                        Err(PlaygroundError::ModelServer {
                            status: 503,
                            body: "loading".into(),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(res.unwrap(), 42);
        assert_eq!(*calls.lock().await, 2);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = Arc::new(Mutex::new(0u32));

        let res: Result<()> = policy
            .retry("test", |_: u32| {
                let calls = calls.clone();
                async move {
                    *calls.lock().await += 1;
                    Err(PlaygroundError::ModelServer {
                        status: 400,
                        body: "bad request".into(),
                    })
                }
            })
            .await;

        assert!(res.is_err());
        assert_eq!(*calls.lock().await, 1);
    }
}
