//! Python REPL tool.
//!
//! Runs model-written code in a child interpreter. This executes arbitrary
//! code on the host, so only enable it against models you trust.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use crate::error::{PlaygroundError, Result};
use crate::tool::Tool;

#[derive(Clone, Debug)]
pub struct PythonReplConfig {
    /// Interpreter invoked as `<interpreter> -c <code>`.
    pub interpreter: String,
    pub timeout_secs: u64,
    /// Maximum number of output lines to return
    pub max_output_lines: usize,
}

impl Default for PythonReplConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".into(),
            timeout_secs: 30,
            max_output_lines: 100,
        }
    }
}

pub struct PythonReplTool {
    config: PythonReplConfig,
}

impl PythonReplTool {
    pub fn new(config: PythonReplConfig) -> Self {
        Self { config }
    }
}

impl Default for PythonReplTool {
    fn default() -> Self {
        Self::new(PythonReplConfig::default())
    }
}

#[async_trait]
impl Tool for PythonReplTool {
    fn name(&self) -> &str {
        "python_repl"
    }

    fn description(&self) -> &str {
        "A Python shell. Use this to execute python commands. Input should be a valid python command. \
If you want to see the output of a value, you should print it out with `print(...)`."
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let code = match &input {
            Value::String(code) => code.clone(),
            other => other
                .get("code")
                .or_else(|| other.get("query"))
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| PlaygroundError::Protocol("missing `code` for python_repl".into()))?,
        };
        let code = sanitize_input(&code);
        tracing::info!(interpreter = %self.config.interpreter, "tool used: python_repl");

        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg("-c")
            .arg(&code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), cmd.output())
            .await
            .map_err(|_| PlaygroundError::ToolInvocation {
                name: "python_repl".into(),
                source: "execution timed out".into(),
            })?
            .map_err(|err| PlaygroundError::ToolInvocation {
                name: "python_repl".into(),
                source: Box::new(err),
            })?;

        let text = if output.status.success() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            // The last stderr line carries the exception, which is what the model needs.
            let stderr = String::from_utf8_lossy(&output.stderr);
            stderr.lines().last().unwrap_or("execution failed").to_string()
        };
        Ok(Value::String(tail_lines(&text, self.config.max_output_lines)))
    }
}

/// Strip whitespace, markdown fences, backticks and a leading `python` tag.
pub fn sanitize_input(code: &str) -> String {
    let mut code = code.trim().trim_matches('`').trim();
    if let Some(rest) = code.strip_prefix("python") {
        if rest.starts_with(char::is_whitespace) {
            code = rest;
        }
    }
    code.trim().trim_matches('`').trim().to_string()
}

fn tail_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() > max {
        lines[lines.len() - max..].join("\n")
    } else {
        text.to_string()
    }
}
