//! Prompt → model → parser pipelines.

use std::sync::Arc;

use tracing::debug;

use crate::error::{PlaygroundError, Result};
use crate::llm::{ChatOptions, LanguageModel};
use crate::memory::ConversationMemory;
use crate::message::Message;
use crate::prompt::{ChatPromptTemplate, PromptTemplate, PromptVars};

/// Turns a raw completion into plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrOutputParser;

impl StrOutputParser {
    pub fn parse(&self, text: &str) -> String {
        text.trim().to_string()
    }
}

pub struct LlmChain<M: LanguageModel> {
    prompt: ChatPromptTemplate,
    model: Arc<M>,
    options: ChatOptions,
    parser: StrOutputParser,
}

impl<M: LanguageModel> LlmChain<M> {
    pub fn new(prompt: ChatPromptTemplate, model: Arc<M>) -> Self {
        Self {
            prompt,
            model,
            options: ChatOptions::default(),
            parser: StrOutputParser,
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn prompt(&self) -> &ChatPromptTemplate {
        &self.prompt
    }

    pub async fn invoke(&self, vars: &PromptVars) -> Result<String> {
        let messages = self.prompt.format_messages(vars)?;
        debug!(messages = messages.len(), "invoking chain");
        let raw = self.model.complete_chat(&messages, &self.options).await?;
        Ok(self.parser.parse(&raw))
    }

    /// Convenience for prompts with exactly one input variable.
    pub async fn run(&self, input: impl Into<String>) -> Result<String> {
        let names = self.prompt.input_variables();
        let [name] = names.as_slice() else {
            return Err(PlaygroundError::Template(format!(
                "`run` needs exactly one input variable, prompt has {names:?}"
            )));
        };
        let mut vars = PromptVars::new();
        vars.insert(name.clone(), input.into());
        self.invoke(&vars).await
    }
}

const CONVERSATION_TEMPLATE: &str = "The following is a friendly conversation between a human and an AI. \
The AI is talkative and provides lots of specific details from its context. \
If the AI does not know the answer to a question, it truthfully says it does not know.

Current conversation:
{history}
Human: {input}
AI:";

/// A chat loop that replays the whole buffered transcript on every turn.
pub struct ConversationChain<M: LanguageModel> {
    model: Arc<M>,
    prompt: PromptTemplate,
    memory: ConversationMemory,
    options: ChatOptions,
}

impl<M: LanguageModel> ConversationChain<M> {
    pub fn new(model: Arc<M>) -> Result<Self> {
        Ok(Self {
            model,
            prompt: PromptTemplate::new(CONVERSATION_TEMPLATE)?,
            memory: ConversationMemory::default(),
            options: ChatOptions::default().with_stop("\nHuman:"),
        })
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub async fn predict(&mut self, input: &str) -> Result<String> {
        let mut vars = PromptVars::new();
        vars.insert("history".into(), self.memory.buffer_string("Human", "AI"));
        vars.insert("input".into(), input.to_string());
        let prompt = self.prompt.format(&vars)?;

        let raw = self
            .model
            .complete_chat(&[Message::user(prompt)], &self.options)
            .await?;
        let reply = StrOutputParser.parse(&raw);

        self.memory.push(Message::user(input));
        self.memory.push(Message::assistant(&reply));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StubModel;
    use crate::message::Role;
    use crate::prompt_vars;

    #[tokio::test]
    async fn chain_formats_calls_and_trims() {
        let model = StubModel::new(vec!["  Isolation and reproducibility.\n".into()]);
        let prompt = ChatPromptTemplate::from_messages([
            (Role::System, "You are a helpful assistant who provides concise answers."),
            (Role::User, "What is the primary benefit of using {topic}?"),
        ])
        .unwrap();
        let chain = LlmChain::new(prompt, model.clone());

        let out = chain
            .invoke(&prompt_vars! { "topic" => "Docker containers" })
            .await
            .unwrap();

        assert_eq!(out, "Isolation and reproducibility.");
        let calls = model.calls();
        assert_eq!(calls[0].0[1].content, "What is the primary benefit of using Docker containers?");
    }

    #[tokio::test]
    async fn run_binds_single_variable() {
        let model = StubModel::new(vec!["summary".into()]);
        let prompt = ChatPromptTemplate::from_template("Summarize {topic}.").unwrap();
        let chain = LlmChain::new(prompt, model.clone());

        assert_eq!(chain.run("LangChain").await.unwrap(), "summary");
        assert_eq!(model.calls()[0].0[0].content, "Summarize LangChain.");
    }

    #[tokio::test]
    async fn run_rejects_multi_variable_prompts() {
        let model = StubModel::new(vec![]);
        let prompt = ChatPromptTemplate::from_template("{a} {b}").unwrap();
        let chain = LlmChain::new(prompt, model);

        assert!(matches!(
            chain.run("x").await.unwrap_err(),
            PlaygroundError::Template(_)
        ));
    }

    #[tokio::test]
    async fn conversation_replays_history() {
        let model = StubModel::new(vec!["Hi Ada!".into(), "Your name is Ada.".into()]);
        let mut chat = ConversationChain::new(model.clone()).unwrap();

        chat.predict("My name is Ada").await.unwrap();
        let reply = chat.predict("What is my name?").await.unwrap();

        assert_eq!(reply, "Your name is Ada.");
        assert_eq!(chat.memory().len(), 4);
        let second_prompt = &model.calls()[1].0[0].content;
        assert!(second_prompt.contains("Human: My name is Ada\nAI: Hi Ada!\nHuman: What is my name?\nAI:"));
    }
}
