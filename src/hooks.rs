use async_trait::async_trait;

use crate::error::Result;
use crate::react::{AgentAction, AgentFinish};

/// Observes a running [`AgentExecutor`](crate::react::AgentExecutor).
#[async_trait]
pub trait AgentHook: Send + Sync {
    async fn on_agent_action(&self, _action: &AgentAction) -> Result<()> {
        Ok(())
    }

    async fn on_tool_end(&self, _action: &AgentAction, _observation: &str) -> Result<()> {
        Ok(())
    }

    async fn on_agent_finish(&self, _finish: &AgentFinish) -> Result<()> {
        Ok(())
    }
}

/// Prints the agent's reasoning trace to stdout as it runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleHook;

#[async_trait]
impl AgentHook for ConsoleHook {
    async fn on_agent_action(&self, action: &AgentAction) -> Result<()> {
        println!("{}", action.log.trim_end());
        Ok(())
    }

    async fn on_tool_end(&self, _action: &AgentAction, observation: &str) -> Result<()> {
        println!("Observation: {}", observation.trim_end());
        Ok(())
    }

    async fn on_agent_finish(&self, finish: &AgentFinish) -> Result<()> {
        println!("{}", finish.log.trim_end());
        println!("\n> Finished chain.");
        Ok(())
    }
}
