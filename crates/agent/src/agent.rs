//! Crew member: a named persona with a task, backed by a ReAct loop.

use crewflow_core::event::EventBus;
use crewflow_core::provider::Provider;
use crewflow_core::tool::ToolRegistry;
use crewflow_core::Result;
use std::sync::Arc;

use crate::client::ModelClient;
use crate::patterns::react::{DEFAULT_MAX_ROUNDS, ReactAgent, ReactOutcome};

const PREAMBLE: &str = "You are an AI agent. You are part of a team of agents working together to complete a task.
I'm going to give you the task description enclosed in <task_description></task_description> tags. I'll also give
you the available context from the other agents in <context></context> tags. If the context
is not available, the <context></context> tags will be empty. You'll also receive the task
expected output enclosed in <task_expected_output></task_expected_output> tags. With all this information
you need to create the best possible response, always respecting the format as described in
<task_expected_output></task_expected_output> tags. If expected output is not available, just create
a meaningful response to complete the task.";

/// A crew member. The backstory is the system prompt of its ReAct loop.
#[derive(Clone)]
pub struct Agent {
    name: String,
    backstory: String,
    task_description: String,
    expected_output: String,
    client: ModelClient,
    tools: Arc<ToolRegistry>,
    max_rounds: usize,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        backstory: impl Into<String>,
        task_description: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_client(name, backstory, task_description, ModelClient::new(provider, model))
    }

    /// Build an agent on an already configured client.
    pub fn with_client(
        name: impl Into<String>,
        backstory: impl Into<String>,
        task_description: impl Into<String>,
        client: ModelClient,
    ) -> Self {
        Self {
            name: name.into(),
            backstory: backstory.into(),
            task_description: task_description.into(),
            expected_output: String::new(),
            client,
            tools: Arc::new(ToolRegistry::new()),
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.client = self.client.with_temperature(temperature);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.client = self.client.with_event_bus(event_bus);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn task_description(&self) -> &str {
        &self.task_description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub(crate) fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.client.event_bus()
    }

    /// Render the task prompt with the context received from upstream agents.
    pub fn compose_prompt(&self, context: &[String]) -> String {
        format!(
            "{PREAMBLE}\n\n<task_description>\n{}\n</task_description>\n\n<task_expected_output>\n{}\n</task_expected_output>\n\n<context>\n{}\n</context>\n\nYour response:",
            self.task_description,
            self.expected_output,
            context.join("\n\n"),
        )
    }

    /// Compose the prompt and run the ReAct loop on it.
    pub async fn run(&self, context: &[String]) -> Result<ReactOutcome> {
        let react = ReactAgent::new(
            self.client.clone(),
            self.tools.clone(),
            self.backstory.as_str(),
        )
        .with_max_rounds(self.max_rounds);
        react.run(&self.compose_prompt(context)).await
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.client.model())
            .field("tools", &self.tools.names())
            .field("max_rounds", &self.max_rounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::*;
    use crewflow_core::message::Role;

    #[test]
    fn prompt_sections_in_order() {
        let provider = Arc::new(SequentialMockProvider::new(Vec::<String>::new()));
        let agent = Agent::new(
            "poet",
            "You write poems.",
            "Write a poem about rust.",
            provider,
            "m",
        )
        .with_expected_output("Four lines.");

        let prompt = agent.compose_prompt(&["a\nb".into(), "c".into()]);
        let description =
            prompt.find("<task_description>\nWrite a poem about rust.\n</task_description>");
        let expected = prompt.find("<task_expected_output>\nFour lines.\n</task_expected_output>");
        let context = prompt.find("<context>\na\nb\n\nc\n</context>");
        assert!(description.is_some() && expected.is_some() && context.is_some());
        assert!(description < expected && expected < context);
        assert!(prompt.ends_with("Your response:"));
    }

    #[test]
    fn empty_context_renders_empty_section() {
        let provider = Arc::new(SequentialMockProvider::new(Vec::<String>::new()));
        let agent = Agent::new("a", "b", "t", provider, "m");
        assert!(agent.compose_prompt(&[]).contains("<context>\n\n</context>"));
    }

    #[tokio::test]
    async fn backstory_is_system_prompt() {
        let provider = Arc::new(SequentialMockProvider::single_text("a poem"));
        let agent = Agent::new("poet", "You write poems.", "Write.", provider.clone(), "m");

        let outcome = agent.run(&[]).await.unwrap();
        assert_eq!(outcome.answer, "a poem");

        let request = provider.request(0);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, "You write poems.");
        assert!(request.messages[1].content.starts_with("<question>"));
        assert!(request.messages[1]
            .content
            .contains("<task_description>\nWrite.\n</task_description>"));
    }
}
