//! ReAct (reason + act) agent: the model writes `Thought/Action/Action Input`
//! lines, tools produce `Observation`s, and the loop ends at `Final Answer:`.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PlaygroundError, Result};
use crate::hooks::AgentHook;
use crate::llm::{ChatOptions, LanguageModel};
use crate::prompt::{ChatPromptTemplate, PromptVars};
use crate::tool::{observation_text, parse_tool_input, ToolRegistry};

pub const REACT_PROMPT: &str = "Answer the following questions as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {input}
Thought:{agent_scratchpad}";

const FINAL_ANSWER: &str = "Final Answer:";
const OBSERVATION_STOP: &str = "\nObservation";
const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";
const EXCEPTION_TOOL: &str = "_Exception";
const ANSWER_AND_ACTION: &str =
    "Parsing LLM output produced both a final answer and a parse-able action: ";
// Observation for malformed turns whose error text is not worth sending back.
const INVALID_RESPONSE: &str = "Invalid or incomplete response";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// The raw model output that produced this action.
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// Result of one [`AgentExecutor::invoke`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRun {
    pub input: String,
    pub output: String,
    pub steps: Vec<(AgentAction, String)>,
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:\s*(.*?)\s*Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
            .expect("valid regex")
    })
}

fn action_only_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action\s*\d*\s*:").expect("valid regex"))
}

fn action_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").expect("valid regex"))
}

/// Parse one model turn into either a tool call or a final answer.
pub fn parse_react_output(text: &str) -> Result<AgentStep> {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = action_regex().captures(text) {
        if includes_answer {
            return Err(PlaygroundError::OutputParse(format!(
                "{ANSWER_AND_ACTION}{text}"
            )));
        }
        let tool = caps[1].trim().to_string();
        let tool_input = caps[2].trim();
        let tool_input = tool_input
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(tool_input);
        return Ok(AgentStep::Action(AgentAction {
            tool,
            tool_input: tool_input.to_string(),
            log: text.to_string(),
        }));
    }

    if includes_answer {
        let output = text
            .rsplit(FINAL_ANSWER)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(AgentStep::Finish(AgentFinish {
            output,
            log: text.to_string(),
        }));
    }

    if !action_only_regex().is_match(text) {
        Err(PlaygroundError::OutputParse(
            "Invalid Format: Missing 'Action:' after 'Thought:'".into(),
        ))
    } else if !action_input_regex().is_match(text) {
        Err(PlaygroundError::OutputParse(
            "Invalid Format: Missing 'Action Input:' after 'Action:'".into(),
        ))
    } else {
        Err(PlaygroundError::OutputParse(format!(
            "Could not parse LLM output: `{text}`"
        )))
    }
}

/// Render past steps the way the prompt's `{agent_scratchpad}` expects.
pub fn format_scratchpad(steps: &[(AgentAction, String)]) -> String {
    let mut thoughts = String::new();
    for (action, observation) in steps {
        thoughts.push_str(&action.log);
        thoughts.push_str(&format!("\nObservation: {observation}\nThought: "));
    }
    thoughts
}

/// Runs the ReAct loop against a model and a tool registry.
pub struct AgentExecutor<M: LanguageModel> {
    model: Arc<M>,
    tools: ToolRegistry,
    prompt: ChatPromptTemplate,
    options: ChatOptions,
    max_iterations: usize,
    handle_parsing_errors: bool,
    hooks: Vec<Arc<dyn AgentHook>>,
}

impl<M: LanguageModel> AgentExecutor<M> {
    pub fn new(model: Arc<M>, tools: ToolRegistry) -> Result<Self> {
        Ok(Self {
            model,
            tools,
            prompt: ChatPromptTemplate::from_template(REACT_PROMPT)?,
            options: ChatOptions::default().with_temperature(0.0),
            max_iterations: 15,
            handle_parsing_errors: true,
            hooks: Vec::new(),
        })
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_handle_parsing_errors(mut self, handle: bool) -> Self {
        self.handle_parsing_errors = handle;
        self
    }

    /// Sampling options for every model call; the `\nObservation` stop is always added.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn AgentHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn base_vars(&self, input: &str) -> PromptVars {
        let tools = self
            .tools
            .describe()
            .into_iter()
            .map(|tool| format!("{}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join("\n");
        let mut vars = PromptVars::new();
        vars.insert("tools".into(), tools);
        vars.insert("tool_names".into(), self.tools.names().join(", "));
        vars.insert("input".into(), input.to_string());
        vars
    }

    fn call_options(&self) -> ChatOptions {
        let mut options = self.options.clone();
        if !options.stop.iter().any(|stop| stop == OBSERVATION_STOP) {
            options.stop.push(OBSERVATION_STOP.to_string());
        }
        options
    }

    pub async fn invoke(&self, input: impl Into<String>) -> Result<AgentRun> {
        let input = input.into();
        let mut vars = self.base_vars(&input);
        let options = self.call_options();
        let mut steps: Vec<(AgentAction, String)> = Vec::new();

        for iteration in 0..self.max_iterations {
            vars.insert("agent_scratchpad".into(), format_scratchpad(&steps));
            let messages = self.prompt.format_messages(&vars)?;
            let raw = self.model.complete_chat(&messages, &options).await?;

            let action = match parse_react_output(&raw) {
                Ok(AgentStep::Finish(finish)) => {
                    info!(iteration, "agent finished");
                    for hook in &self.hooks {
                        hook.on_agent_finish(&finish).await?;
                    }
                    return Ok(AgentRun {
                        input,
                        output: finish.output,
                        steps,
                    });
                }
                Ok(AgentStep::Action(action)) => action,
                Err(PlaygroundError::OutputParse(message)) if self.handle_parsing_errors => {
                    warn!(iteration, %message, "unparseable agent output");
                    let observation = if message.starts_with(ANSWER_AND_ACTION) {
                        INVALID_RESPONSE.to_string()
                    } else {
                        message
                    };
                    let action = AgentAction {
                        tool: EXCEPTION_TOOL.into(),
                        tool_input: observation.clone(),
                        log: raw,
                    };
                    steps.push((action, observation));
                    continue;
                }
                Err(err) => return Err(err),
            };

            for hook in &self.hooks {
                hook.on_agent_action(&action).await?;
            }
            let observation = self.run_tool(&action).await;
            for hook in &self.hooks {
                hook.on_tool_end(&action, &observation).await?;
            }
            steps.push((action, observation));
        }

        warn!(max_iterations = self.max_iterations, "agent hit iteration limit");
        Ok(AgentRun {
            input,
            output: ITERATION_LIMIT_OUTPUT.to_string(),
            steps,
        })
    }

    async fn run_tool(&self, action: &AgentAction) -> String {
        if !self.tools.contains(&action.tool) {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool,
                self.tools.names().join(", ")
            );
        }
        info!(tool = %action.tool, input = %action.tool_input, "calling tool");
        match self
            .tools
            .call(&action.tool, parse_tool_input(&action.tool_input))
            .await
        {
            Ok(value) => observation_text(&value),
            Err(err) => {
                warn!(tool = %action.tool, error = %err, "tool failed");
                format!("Error: {err}")
            }
        }
    }
}
