use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlaygroundError>;

#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("could not reach model server at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("model server returned {status}: {body}")]
    ModelServer { status: u16, body: String },

    #[error("language model error: {0}")]
    LanguageModel(String),

    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("prompt template error: {0}")]
    Template(String),

    #[error("could not parse LLM output: {0}")]
    OutputParse(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlaygroundError {
    /// True when the failure points at the server or model being unavailable
    /// rather than at a bad reply.
    pub fn is_connectivity(&self) -> bool {
        match self {
            PlaygroundError::Unreachable { .. } => true,
            PlaygroundError::ModelServer { status, body } => {
                *status == 404 && body.contains("not found")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_counts_as_connectivity() {
        let err = PlaygroundError::ModelServer {
            status: 404,
            body: r#"{"error":"model 'llama3.2:latest' not found"}"#.into(),
        };
        assert!(err.is_connectivity());

        let err = PlaygroundError::ModelServer {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.is_connectivity());
        assert!(!PlaygroundError::OutputParse("x".into()).is_connectivity());
    }
}
