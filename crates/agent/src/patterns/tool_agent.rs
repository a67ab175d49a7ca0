//! Single-shot tool use: one completion to pick tools, one to answer.
//!
//! Unlike [`ReactAgent`](super::react::ReactAgent) there is no loop. The
//! model sees the tool signatures once, its `<tool_call>` blocks are
//! validated and dispatched, and a second completion turns the observation
//! into an answer.

use crewflow_core::history::History;
use crewflow_core::message::Role;
use crewflow_core::protocol::Tag;
use crewflow_core::tool::{Observation, ToolRegistry};
use crewflow_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

use super::react::parse_tool_call;
use crate::client::ModelClient;
use crate::prompts;

pub struct ToolAgent {
    client: ModelClient,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
}

/// The result of a single-shot tool run.
#[derive(Debug, Clone)]
pub struct ToolAgentOutcome {
    pub answer: String,
    /// Results of the dispatched calls, keyed by call id.
    pub observation: Observation,
}

impl ToolAgent {
    /// Create a tool agent. The system prompt is required.
    pub fn new(client: ModelClient, tools: Arc<ToolRegistry>, system_prompt: &str) -> Result<Self> {
        if system_prompt.trim().is_empty() {
            return Err(Error::Config {
                message: "tool agent requires a system prompt".into(),
            });
        }
        Ok(Self {
            system_prompt: prompts::render(system_prompt, &tools.signatures()),
            client,
            tools,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub async fn run(&self, user_message: &str) -> Result<ToolAgentOutcome> {
        let mut history = History::unbounded();
        history.push(Role::System, self.system_prompt.as_str());
        history.push(Role::User, user_message);

        let output = self.client.complete(&history).await?;
        let calls = Tag::ToolCall.extract(&output);
        if !calls.found {
            debug!("No tool calls requested, returning first completion");
            return Ok(ToolAgentOutcome {
                answer: output,
                observation: Observation::new(),
            });
        }

        let mut observation = Observation::new();
        for payload in &calls.segments {
            let call = self.tools.validate(parse_tool_call(payload)?)?;
            info!(tool = %call.name, call_id = call.id, "Dispatching tool call");
            let value = self.tools.dispatch(&call).await?;
            observation.insert(call.id, value);
        }

        let mut followup = History::unbounded();
        followup.push(Role::User, user_message);
        followup.push(Role::User, format!("Observation: {}", observation.to_json()));
        let answer = self.client.complete(&followup).await?;

        Ok(ToolAgentOutcome { answer, observation })
    }
}
