use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{PlaygroundError, Result};
use crate::tool::Tool;

pub struct WordLengthTool;

#[async_trait]
impl Tool for WordLengthTool {
    fn name(&self) -> &str {
        "get_word_length"
    }

    fn description(&self) -> &str {
        "Returns the length of a word. Input is the word itself, e.g. onomatopoeia."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {"word": {"type": "string"}},
            "required": ["word"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let word = match &input {
            Value::String(word) => word.as_str(),
            other => other.get("word").and_then(Value::as_str).ok_or_else(|| {
                PlaygroundError::Protocol("missing `word` for get_word_length".into())
            })?,
        };
        let word = strip_quotes(word.trim());
        tracing::info!(word, "tool used: get_word_length");
        Ok(json!(word.chars().count()))
    }
}

pub(crate) fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_characters() {
        let out = WordLengthTool.call(json!("onomatopoeia")).await.unwrap();
        assert_eq!(out, json!(12));
    }

    #[tokio::test]
    async fn accepts_object_and_quoted_input() {
        assert_eq!(WordLengthTool.call(json!({"word": "rust"})).await.unwrap(), json!(4));
        assert_eq!(WordLengthTool.call(json!("'café'")).await.unwrap(), json!(4));
    }

    #[tokio::test]
    async fn rejects_missing_word() {
        assert!(WordLengthTool.call(json!({"text": "x"})).await.is_err());
    }
}
