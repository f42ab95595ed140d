//! Agent runtimes.
//!
//! [`ClaudeRuntime`] sends invocations to Claude and collects the streamed
//! response; [`LocalRuntime`] produces deterministic results without any
//! network or credentials. Both sit behind the [`AgentRuntime`] trait, so
//! the coordinator and scheduler never know which one they are driving.

pub mod local;

pub use local::LocalRuntime;

use anyhow::Result;
use claude_agent_sdk::{query, ClaudeAgentOptions, ContentBlock, Message};
use futures::StreamExt;
use insight_crew_sdk::{
    async_trait, log_agent_complete, log_agent_failed, log_agent_message, log_agent_start,
    AgentInvocation, AgentRuntime, CrewResult,
};
use std::sync::Arc;

use crate::config::{RuntimeMode, Settings};

/// Runtime backed by the Claude agent SDK
pub struct ClaudeRuntime;

impl ClaudeRuntime {
    pub fn new() -> Self {
        Self
    }

    async fn execute(&self, invocation: &AgentInvocation) -> Result<String> {
        let options = ClaudeAgentOptions::builder()
            .system_prompt(invocation.system_prompt.clone())
            .build();

        let stream = query(&invocation.prompt, Some(options)).await?;
        let mut stream = Box::pin(stream);
        let mut response_text = String::new();

        while let Some(message) = stream.next().await {
            match message? {
                Message::Assistant { message, .. } => {
                    for block in &message.content {
                        if let ContentBlock::Text { text } = block {
                            log_agent_message!(invocation.task_id, invocation.agent.as_str(), text);
                            response_text.push_str(text);
                        }
                    }
                }
                Message::Result { .. } => break,
                _ => {}
            }
        }

        Ok(response_text)
    }
}

impl Default for ClaudeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRuntime for ClaudeRuntime {
    async fn run(&self, invocation: AgentInvocation) -> CrewResult<String> {
        log_agent_start!(
            invocation.task_id,
            invocation.agent.as_str(),
            invocation.description
        );

        match self.execute(&invocation).await {
            Ok(response) => {
                log_agent_complete!(invocation.task_id, invocation.agent.as_str(), "Completed");
                Ok(response)
            }
            Err(e) => {
                log_agent_failed!(invocation.task_id, invocation.agent.as_str(), e.to_string());
                Err(e.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "claude"
    }
}

/// Pick the runtime configured in the settings
pub fn runtime_from_settings(settings: &Settings) -> Arc<dyn AgentRuntime> {
    match settings.runtime {
        RuntimeMode::Claude => Arc::new(ClaudeRuntime::new()),
        RuntimeMode::Local => Arc::new(LocalRuntime::new(settings.max_file_size_bytes())),
    }
}
