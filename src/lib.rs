//! Building blocks for talking to a local Ollama server.
//!
//! The crate provides:
//! - An HTTP client for the model server (`OllamaClient`) behind the `LanguageModel` trait.
//! - Prompt templates and a prompt → model → parser chain.
//! - A ReAct agent that loops between the model and registered tools.
//! - Two debate simulators that pit personas against each other.

pub mod chain;
pub mod config;
pub mod debate;
mod error;
pub mod hooks;
pub mod llm;
pub mod memory;
pub mod message;
pub mod prompt;
pub mod react;
pub mod telemetry;
mod tool;
pub mod tools;

pub use chain::{ConversationChain, LlmChain, StrOutputParser};
pub use config::AppConfig;
pub use debate::{Debate, DebateAgent, DebateTurn, EthicsDebate, FramedDebater, Transcript};
pub use error::{PlaygroundError, Result};
pub use hooks::{AgentHook, ConsoleHook};
pub use llm::{ChatOptions, LanguageModel, ModelInfo, OllamaClient, StubModel};
pub use memory::ConversationMemory;
pub use message::{Message, Role};
pub use prompt::{ChatPromptTemplate, PromptTemplate, PromptVars};
pub use react::{AgentAction, AgentExecutor, AgentFinish, AgentRun, AgentStep};
pub use telemetry::{init_tracing, LogFormat, RetryPolicy};
pub use tool::{Tool, ToolDescription, ToolRegistry};
