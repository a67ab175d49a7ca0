//! ReAct pattern: Thought → Action → Observation loop over the tag protocol.
//!
//! Each round the model either answers inside `<response>` tags, which ends
//! the run, or emits `<thought>` and `<tool_call>` blocks. Tool calls are
//! validated against the registry, dispatched, and their results are fed back
//! as one `<observation>` message keyed by call id.
//!
//! # Termination
//!
//! - a `<response>` segment in the latest output: its first segment is the
//!   answer;
//! - the round budget runs out: one more unconstrained completion is made and
//!   its raw text is the answer;
//! - no tools registered: the protocol is skipped and a single completion is
//!   the answer.
//!
//! Malformed tool-call payloads, unknown tools, and bad arguments end the run
//! with an error.

use chrono::Utc;
use crewflow_core::event::DomainEvent;
use crewflow_core::history::History;
use crewflow_core::message::Role;
use crewflow_core::protocol::Tag;
use crewflow_core::tool::{Observation, ToolCall, ToolRegistry};
use crewflow_core::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::ModelClient;
use crate::prompts;
use crate::trace::{Trace, TraceEntry};

/// Default round budget.
pub const DEFAULT_MAX_ROUNDS: usize = 10;

/// A ReAct agent: a model client, a tool registry, and a system prompt.
#[derive(Clone)]
pub struct ReactAgent {
    client: ModelClient,
    tools: Arc<ToolRegistry>,
    /// Prompt as given, `{tools}` still in place.
    template: String,
    /// Prompt sent to the model.
    system_prompt: String,
    max_rounds: usize,
}

/// The result of a ReAct execution.
#[derive(Debug, Clone)]
pub struct ReactOutcome {
    /// The final answer text.
    pub answer: String,
    /// Number of completion rounds used.
    pub rounds: usize,
    /// Total tool calls dispatched.
    pub tool_calls_made: usize,
    /// Complete reasoning trace.
    pub trace: Vec<TraceEntry>,
    /// The round budget ran out and the answer is a fallback completion.
    pub exhausted: bool,
}

impl ReactAgent {
    /// Create a new ReAct agent.
    ///
    /// `{tools}` in `system_prompt` is replaced with the signatures of the
    /// registered tools.
    pub fn new(
        client: ModelClient,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        let template = system_prompt.into();
        let system_prompt = prompts::render(&template, &tools.signatures());
        Self {
            client,
            tools,
            template,
            system_prompt,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Replace the tool registry and re-render the system prompt.
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.system_prompt = prompts::render(&self.template, &tools.signatures());
        self.tools = tools;
        self
    }

    /// Set the round budget.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Run the loop on `user_message` with the configured budget.
    pub async fn run(&self, user_message: &str) -> Result<ReactOutcome> {
        self.run_with_rounds(user_message, self.max_rounds).await
    }

    /// Run the loop on `user_message` with an explicit round budget.
    pub async fn run_with_rounds(
        &self,
        user_message: &str,
        max_rounds: usize,
    ) -> Result<ReactOutcome> {
        let mut history = History::unbounded();
        if !self.system_prompt.is_empty() {
            history.push(Role::System, self.system_prompt.as_str());
        }
        history.push(Role::User, Tag::Question.wrap(user_message));

        let mut trace = Trace::new();

        if self.tools.is_empty() {
            debug!(model = %self.client.model(), "No tools registered, single completion");
            let answer = self.client.complete(&history).await?;
            return Ok(ReactOutcome {
                answer,
                rounds: 1,
                tool_calls_made: 0,
                trace: trace.into_entries(),
                exhausted: false,
            });
        }

        info!(
            model = %self.client.model(),
            max_rounds,
            tools = self.tools.len(),
            "ReAct loop starting"
        );

        let mut tool_calls_made = 0usize;

        for round in 1..=max_rounds {
            debug!(round, "ReAct round");
            let output = self.client.complete(&history).await?;

            if let Some(answer) = Tag::Response.extract(&output).first() {
                info!(rounds = round, tool_calls = tool_calls_made, "ReAct loop completed");
                return Ok(ReactOutcome {
                    answer: answer.to_string(),
                    rounds: round,
                    tool_calls_made,
                    trace: trace.into_entries(),
                    exhausted: false,
                });
            }

            history.push(Role::Assistant, output.as_str());

            for thought in Tag::Thought.extract(&output).segments {
                debug!(round, thought = %thought, "Thought");
                trace.thought(&thought);
            }

            let calls = Tag::ToolCall.extract(&output);
            if calls.found {
                let observation = self.dispatch_all(&calls.segments, &mut trace).await?;
                tool_calls_made += calls.segments.len();
                history.push(Role::User, Tag::Observation.wrap(&observation.to_json()));
            } else {
                debug!(round, "No response or tool call in output, continuing");
            }
        }

        warn!("ReAct: max rounds reached ({max_rounds}), requesting a final completion");
        let answer = self.client.complete(&history).await?;
        Ok(ReactOutcome {
            answer,
            rounds: max_rounds,
            tool_calls_made,
            trace: trace.into_entries(),
            exhausted: true,
        })
    }

    /// Parse, validate, and dispatch every `<tool_call>` payload of one reply.
    async fn dispatch_all(&self, payloads: &[String], trace: &mut Trace) -> Result<Observation> {
        let mut observation = Observation::new();
        for payload in payloads {
            let call = parse_tool_call(payload)?;
            let call = self.tools.validate(call)?;
            let arguments = serde_json::Value::Object(call.arguments.clone());
            trace.action(&format!("{}({})", call.name, arguments));
            info!(tool = %call.name, call_id = call.id, "Dispatching tool call");

            let start = std::time::Instant::now();
            let result = self.tools.dispatch(&call).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            if let Some(bus) = self.client.event_bus() {
                bus.publish(DomainEvent::ToolExecuted {
                    tool_name: call.name.clone(),
                    call_id: call.id,
                    success: result.is_ok(),
                    duration_ms,
                    timestamp: Utc::now(),
                });
            }

            let value = result?;
            trace.observation(&value.to_string());
            observation.insert(call.id, value);
        }
        Ok(observation)
    }
}

/// Decode a `<tool_call>` payload.
pub fn parse_tool_call(payload: &str) -> Result<ToolCall> {
    serde_json::from_str(payload).map_err(|e| Error::Protocol {
        payload: payload.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_helpers::*;
    use crate::trace::TraceKind;
    use crewflow_core::error::ToolError;
    use crewflow_core::event::EventBus;
    use crewflow_core::tool::{FnTool, ParamType};
    use crewflow_core::{Provider, ProviderError};
    use serde_json::json;

    fn agent_with(provider: Arc<SequentialMockProvider>, tools: ToolRegistry) -> ReactAgent {
        ReactAgent::new(
            ModelClient::new(provider, "mock-model"),
            Arc::new(tools),
            prompts::REACT_SYSTEM_PROMPT,
        )
    }

    fn area_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(
            FnTool::new("area", "Area of a circle.", |args| {
                let r = crewflow_core::tool::f64_arg(args, "radius")?;
                Ok(json!(r * r * 3.0))
            })
            .param("radius", ParamType::Float),
        ));
        registry
    }

    #[tokio::test]
    async fn tool_free_agent_makes_exactly_one_call() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "<thought>hmm</thought> Plain answer",
        ));
        let agent = agent_with(provider.clone(), ToolRegistry::new()).with_max_rounds(5);

        let outcome = agent.run("Hello").await.unwrap();
        assert_eq!(provider.call_count(), 1);
        assert_eq!(outcome.answer, "<thought>hmm</thought> Plain answer");
        assert_eq!(outcome.rounds, 1);
        assert!(!outcome.exhausted);
    }

    #[tokio::test]
    async fn initial_history_is_system_then_question() {
        let provider = Arc::new(SequentialMockProvider::single_text("<response>4</response>"));
        let agent = agent_with(provider.clone(), area_registry());

        let outcome = agent.run("What is 2+2?").await.unwrap();
        assert_eq!(outcome.answer, "4");

        let request = provider.request(0);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("\"name\":\"area\""));
        assert!(!request.messages[0].content.contains("{tools}"));
        assert_eq!(request.messages[1].content, "<question>What is 2+2?</question>");
    }

    #[tokio::test]
    async fn thought_action_observation_then_response() {
        let provider = Arc::new(SequentialMockProvider::new([
            format!(
                "<thought>I need the area</thought>\n{}",
                tool_call("area", json!({"radius": "2"}), 0)
            ),
            "<thought>Done</thought><response>The area is 12</response>".to_string(),
        ]));
        let agent = agent_with(provider.clone(), area_registry());

        let outcome = agent.run("Area of radius 2?").await.unwrap();
        assert_eq!(outcome.answer, "The area is 12");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.tool_calls_made, 1);

        let kinds: Vec<_> = outcome.trace.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [TraceKind::Thought, TraceKind::Action, TraceKind::Observation]);
        assert!(outcome.trace[1].content.contains("\"radius\":2.0"));

        // second call sees: system, question, assistant output, observation
        let second = provider.contents(1);
        assert_eq!(second.len(), 4);
        assert!(second[2].contains("<tool_call>"));
        assert_eq!(second[3], "<observation>{\"0\":12.0}</observation>");
    }

    #[tokio::test]
    async fn several_calls_in_one_round_share_an_observation() {
        let provider = Arc::new(SequentialMockProvider::new([
            format!(
                "{}{}",
                tool_call("area", json!({"radius": 1}), 0),
                tool_call("area", json!({"radius": 2.0}), 1)
            ),
            "<response>ok</response>".to_string(),
        ]));
        let agent = agent_with(provider.clone(), area_registry());

        let outcome = agent.run("two areas").await.unwrap();
        assert_eq!(outcome.tool_calls_made, 2);
        let last = provider.contents(1).pop().unwrap();
        assert_eq!(last, "<observation>{\"0\":3.0,\"1\":12.0}</observation>");
    }

    #[tokio::test]
    async fn round_without_tags_continues() {
        let provider = Arc::new(SequentialMockProvider::new([
            "Let me think about it.",
            "<response>done</response>",
        ]));
        let agent = agent_with(provider.clone(), area_registry());

        let outcome = agent.run("q").await.unwrap();
        assert_eq!(outcome.answer, "done");
        assert_eq!(outcome.rounds, 2);
        // no observation appended after a tag-free round
        assert_eq!(provider.contents(1).len(), 3);
    }

    #[tokio::test]
    async fn budget_exhaustion_falls_back_to_raw_completion() {
        let provider = Arc::new(SequentialMockProvider::new([
            "<thought>still thinking</thought>",
            "<thought>and thinking</thought>",
            "Best guess: 42",
        ]));
        let agent = agent_with(provider.clone(), area_registry()).with_max_rounds(2);

        let outcome = agent.run("q").await.unwrap();
        assert!(outcome.exhausted);
        assert_eq!(outcome.answer, "Best guess: 42");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(outcome.trace.len(), 2);
    }

    #[tokio::test]
    async fn malformed_tool_call_is_protocol_error() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "<tool_call>{\"name\": \"area\", \"arguments\": </tool_call>",
        ));
        let agent = agent_with(provider, area_registry());

        let err = agent.run("q").await.unwrap_err();
        match err {
            Error::Protocol { payload, .. } => assert!(payload.starts_with("{\"name\"")),
            other => panic!("Expected Protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tool_call_without_id_is_protocol_error() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "<tool_call>{\"name\": \"area\", \"arguments\": {\"radius\": 1}}</tool_call>",
        ));
        let agent = agent_with(provider, area_registry());
        assert!(matches!(agent.run("q").await, Err(Error::Protocol { .. })));
    }

    #[tokio::test]
    async fn unknown_tool_is_fatal_with_call_id() {
        let provider = Arc::new(SequentialMockProvider::single_text(&tool_call(
            "teleport",
            json!({}),
            3,
        )));
        let agent = agent_with(provider.clone(), area_registry());

        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Tool(ToolError::UnknownTool { call_id: 3, .. })
        ));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn type_mismatch_is_fatal() {
        let provider = Arc::new(SequentialMockProvider::single_text(&tool_call(
            "area",
            json!({"radius": "wide"}),
            0,
        )));
        let agent = agent_with(provider, area_registry());
        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::TypeMismatch { call_id: 0, .. })));
    }

    #[tokio::test]
    async fn provider_errors_pass_through() {
        struct Down;
        #[async_trait::async_trait]
        impl Provider for Down {
            fn name(&self) -> &str {
                "down"
            }
            async fn complete(
                &self,
                _request: crewflow_core::ProviderRequest,
            ) -> std::result::Result<crewflow_core::ProviderResponse, ProviderError> {
                Err(ProviderError::Network("connection reset".into()))
            }
        }

        let agent = ReactAgent::new(
            ModelClient::new(Arc::new(Down), "m"),
            Arc::new(area_registry()),
            "",
        );
        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
    }

    #[tokio::test]
    async fn tool_executions_are_published() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("area", json!({"radius": 1.0}), 0),
            "<response>3</response>".to_string(),
        ]));
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let agent = ReactAgent::new(
            ModelClient::new(provider, "mock-model").with_event_bus(bus.clone()),
            Arc::new(area_registry()),
            prompts::REACT_SYSTEM_PROMPT,
        );

        agent.run("q").await.unwrap();

        let mut tool_events = 0;
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::ToolExecuted { tool_name, success, .. } = event.as_ref() {
                assert_eq!(tool_name, "area");
                assert!(*success);
                tool_events += 1;
            }
        }
        assert_eq!(tool_events, 1);
    }

    #[test]
    fn with_tools_rerenders_prompt() {
        let provider = Arc::new(SequentialMockProvider::new(Vec::<String>::new()));
        let agent = agent_with(provider, ToolRegistry::new());
        assert!(!agent.system_prompt().contains("\"area\""));
        let agent = agent.with_tools(Arc::new(area_registry()));
        assert!(agent.system_prompt().contains("\"area\""));
    }
}
