use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PlaygroundError, Result};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// Optionally return a JSON Schema-like object describing the expected arguments.
    fn parameters(&self) -> Option<Value> {
        None
    }

    async fn call(&self, input: Value) -> Result<Value>;
}

/// Static description of a tool that can be embedded in prompts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub parameters: Option<Value>,
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool names, sorted so prompts are stable across runs.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn describe(&self) -> Vec<ToolDescription> {
        let mut descriptions: Vec<ToolDescription> = self
            .tools
            .values()
            .map(|tool| ToolDescription {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();

        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        descriptions
    }

    pub async fn call(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| PlaygroundError::ToolNotFound(name.to_string()))?;
        tool.call(input).await.map_err(|err| match err {
            PlaygroundError::ToolInvocation { .. } => err,
            other => PlaygroundError::ToolInvocation {
                name: name.to_string(),
                source: Box::new(other),
            },
        })
    }
}

/// Interpret free-text action input: JSON when it parses, a plain string otherwise.
pub fn parse_tool_input(raw: &str) -> Value {
    let trimmed = raw.trim();
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(trimmed.to_string()),
    }
}

/// Render a tool result the way it is shown to the model as an observation.
pub fn observation_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        async fn call(&self, input: Value) -> Result<Value> {
            Ok(input)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn call(&self, _input: Value) -> Result<Value> {
            Err(PlaygroundError::Protocol("nope".into()))
        }
    }

    #[tokio::test]
    async fn calls_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let out = registry.call("echo", json!({"text": "ping"})).await.unwrap();
        assert_eq!(out, json!({"text": "ping"}));
        assert!(registry.contains("echo"));
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let registry = ToolRegistry::new();
        let err = registry.call("missing", Value::Null).await.unwrap_err();
        assert!(matches!(err, PlaygroundError::ToolNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn tool_errors_are_wrapped_with_name() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool);
        let err = registry.call("fail", Value::Null).await.unwrap_err();
        assert!(matches!(err, PlaygroundError::ToolInvocation { ref name, .. } if name == "fail"));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(FailingTool);
        registry.register(EchoTool);
        assert_eq!(registry.names(), vec!["echo", "fail"]);
        assert_eq!(registry.describe()[0].name, "echo");
    }

    #[test]
    fn parses_action_input() {
        assert_eq!(parse_tool_input(r#" {"a": 12, "b": 12} "#), json!({"a": 12, "b": 12}));
        assert_eq!(parse_tool_input("onomatopoeia"), json!("onomatopoeia"));
        assert_eq!(parse_tool_input("12"), json!("12"));
        assert_eq!(observation_text(&json!(12)), "12");
        assert_eq!(observation_text(&json!("done")), "done");
    }
}
