use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{PlaygroundError, Result};
use crate::tool::Tool;

pub struct MultiplyTool;

#[async_trait]
impl Tool for MultiplyTool {
    fn name(&self) -> &str {
        "multiply"
    }

    fn description(&self) -> &str {
        "Multiplies two integers together. Input is {\"a\": int, \"b\": int} or `a, b`."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
            "required": ["a", "b"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let (a, b) = match &input {
            Value::String(text) => parse_pair(text)?,
            Value::Array(items) if items.len() == 2 => (as_int(&items[0], "a")?, as_int(&items[1], "b")?),
            other => (get_int(other, "a")?, get_int(other, "b")?),
        };
        tracing::info!(a, b, "tool used: multiply");
        let product = a.checked_mul(b).ok_or_else(|| {
            PlaygroundError::Protocol(format!("{a} * {b} overflows a 64-bit integer"))
        })?;
        Ok(json!(product))
    }
}

fn get_int(input: &Value, field: &str) -> Result<i64> {
    let value = input
        .get(field)
        .ok_or_else(|| PlaygroundError::Protocol(format!("missing `{field}` for multiply")))?;
    as_int(value, field)
}

fn as_int(value: &Value, field: &str) -> Result<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| PlaygroundError::Protocol(format!("`{field}` for multiply is not an integer")))
}

/// Accepts `12, 12`, `12 * 12`, `12 x 12` and `a=12, b=12`.
fn parse_pair(text: &str) -> Result<(i64, i64)> {
    let numbers: Vec<i64> = text
        .split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter(|part| !part.is_empty() && *part != "-")
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| PlaygroundError::Protocol(format!("cannot read integers from `{text}`")))?;
    match numbers.as_slice() {
        [a, b] => Ok((*a, *b)),
        _ => Err(PlaygroundError::Protocol(format!(
            "multiply expects two integers, got `{text}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiplies_object_input() {
        let out = MultiplyTool.call(json!({"a": 12, "b": 12})).await.unwrap();
        assert_eq!(out, json!(144));
    }

    #[tokio::test]
    async fn multiplies_free_text_input() {
        assert_eq!(MultiplyTool.call(json!("12, 12")).await.unwrap(), json!(144));
        assert_eq!(MultiplyTool.call(json!("a=3, b=-4")).await.unwrap(), json!(-12));
        assert_eq!(MultiplyTool.call(json!([6, "7"])).await.unwrap(), json!(42));
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        assert!(MultiplyTool.call(json!("twelve")).await.is_err());
        assert!(MultiplyTool.call(json!({"a": 1.5, "b": 2})).await.is_err());
        assert!(MultiplyTool.call(json!({"a": i64::MAX, "b": 2})).await.is_err());
    }
}
