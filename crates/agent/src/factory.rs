//! Build agents and crews from configuration.

use crewflow_config::{AgentManifest, AgentSettings, AppConfig, CrewManifest};
use crewflow_core::event::EventBus;
use crewflow_core::provider::Provider;
use crewflow_core::tool::ToolRegistry;
use crewflow_core::{Error, Result};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::client::ModelClient;
use crate::crew::Crew;
use crate::patterns::{ReactAgent, ReflectionAgent, ToolAgent};
use crate::prompts;

/// Which loop an agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    React,
    Tool,
    Reflection,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Tool => "tool",
            Self::Reflection => "reflection",
        }
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "react" => Ok(Self::React),
            "tool" => Ok(Self::Tool),
            "reflection" => Ok(Self::Reflection),
            other => Err(Error::Config {
                message: format!(
                    "unknown agent kind '{other}' (expected react, tool or reflection)"
                ),
            }),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An agent picked by [`AgentKind`] at runtime.
pub enum AnyAgent {
    React(ReactAgent),
    Tool(ToolAgent),
    Reflection(ReflectionAgent),
}

impl AnyAgent {
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::React(_) => AgentKind::React,
            Self::Tool(_) => AgentKind::Tool,
            Self::Reflection(_) => AgentKind::Reflection,
        }
    }

    /// Run the agent on `input` and return its final text.
    pub async fn run(&self, input: &str) -> Result<String> {
        match self {
            Self::React(agent) => Ok(agent.run(input).await?.answer),
            Self::Tool(agent) => Ok(agent.run(input).await?.answer),
            Self::Reflection(agent) => Ok(agent.run(input).await?.final_candidate),
        }
    }
}

/// Creates agents that share one provider and the configured settings.
pub struct AgentFactory {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    settings: AgentSettings,
    event_bus: Option<Arc<EventBus>>,
}

impl AgentFactory {
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self {
            provider,
            model: config.default_model.clone(),
            temperature: config.default_temperature,
            max_tokens: Some(config.default_max_tokens),
            settings: config.agent.clone(),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Use a model other than `default_model`.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// A client on the configured model and sampling settings.
    pub fn client(&self) -> ModelClient {
        let client = ModelClient::new(self.provider.clone(), self.model.as_str())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        match &self.event_bus {
            Some(bus) => client.with_event_bus(bus.clone()),
            None => client,
        }
    }

    /// A ReAct agent. Without a system prompt the built-in one is used.
    pub fn react(&self, tools: Arc<ToolRegistry>, system_prompt: Option<&str>) -> ReactAgent {
        ReactAgent::new(
            self.client(),
            tools,
            system_prompt.unwrap_or(prompts::REACT_SYSTEM_PROMPT),
        )
        .with_max_rounds(self.settings.max_rounds)
    }

    pub fn tool_agent(
        &self,
        tools: Arc<ToolRegistry>,
        system_prompt: Option<&str>,
    ) -> Result<ToolAgent> {
        ToolAgent::new(
            self.client(),
            tools,
            system_prompt.unwrap_or(prompts::TOOL_SYSTEM_PROMPT),
        )
    }

    pub fn reflection(&self) -> ReflectionAgent {
        ReflectionAgent::new(self.client())
            .with_max_cycles(self.settings.max_cycles)
            .with_history_length(self.settings.history_length)
            .with_stop_token(self.settings.stop_token.as_str())
    }

    /// Build an agent by kind. The reflection loop takes no tools and uses
    /// `system_prompt` as its generator persona.
    pub fn create(
        &self,
        kind: AgentKind,
        tools: Arc<ToolRegistry>,
        system_prompt: Option<&str>,
    ) -> Result<AnyAgent> {
        let agent = match kind {
            AgentKind::React => AnyAgent::React(self.react(tools, system_prompt)),
            AgentKind::Tool => AnyAgent::Tool(self.tool_agent(tools, system_prompt)?),
            AgentKind::Reflection => {
                let agent = self.reflection();
                AnyAgent::Reflection(match system_prompt {
                    Some(prompt) => agent.with_generation_prompt(prompt),
                    None => agent,
                })
            }
        };
        debug!(kind = %kind, "Agent created");
        Ok(agent)
    }

    /// A crew member from its manifest entry. Tool names resolve against
    /// the built-in tools; an unknown name is a configuration error.
    pub fn crew_agent(&self, manifest: &AgentManifest) -> Result<Agent> {
        let tools =
            crewflow_tools::registry_with(&manifest.tools).map_err(|e| Error::Config {
                message: format!("agent '{}': {e}", manifest.name),
            })?;
        Ok(Agent::with_client(
            manifest.name.as_str(),
            manifest.backstory.as_str(),
            manifest.task.as_str(),
            self.client(),
        )
        .with_expected_output(manifest.expected_output.as_str())
        .with_tools(Arc::new(tools))
        .with_max_rounds(manifest.max_rounds.unwrap_or(self.settings.max_rounds)))
    }

    /// Register every agent of the manifest, then wire `depends_on`.
    pub fn build_crew(&self, manifest: &CrewManifest) -> Result<Crew> {
        manifest.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

        let mut crew = Crew::new();
        if let Some(bus) = &self.event_bus {
            crew = crew.with_event_bus(bus.clone());
        }

        let mut ids = Vec::with_capacity(manifest.agents.len());
        for entry in &manifest.agents {
            ids.push(crew.add_agent(self.crew_agent(entry)?)?);
        }

        for (entry, id) in manifest.agents.iter().zip(&ids) {
            for upstream in &entry.depends_on {
                let upstream = crew.find(upstream).ok_or_else(|| Error::Config {
                    message: format!(
                        "agent '{}' depends on unknown agent '{upstream}'",
                        entry.name
                    ),
                })?;
                crew.add_dependency(*id, upstream)?;
            }
        }

        info!(agents = crew.len(), "Crew built from manifest");
        Ok(crew)
    }
}
