//! Crew manifests: declarative crew definitions in TOML.
//!
//! ```toml
//! [[agents]]
//! name = "poet"
//! backstory = "You are a well-known poet."
//! task = "Write a poem about the meaning of life."
//! expected_output = "Just output the poem, without any title or introductory sentences"
//!
//! [[agents]]
//! name = "translator"
//! backstory = "You are a translator from English to Spanish."
//! task = "Translate the poem into Spanish."
//! depends_on = ["poet"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

/// A crew definition: agents plus their dependencies, in registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrewManifest {
    #[serde(default)]
    pub agents: Vec<AgentManifest>,
}

/// One agent of a crew manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentManifest {
    /// Unique name within the crew
    pub name: String,

    /// Persona, used as the agent's system prompt
    pub backstory: String,

    /// What the agent has to do
    pub task: String,

    /// What the result should look like
    #[serde(default)]
    pub expected_output: String,

    /// Tool names from the built-in registry
    #[serde(default)]
    pub tools: Vec<String>,

    /// Names of agents whose output this agent receives as context
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Round budget override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rounds: Option<usize>,
}

impl CrewManifest {
    /// Load and validate a manifest file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let manifest: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        manifest.validate()?;
        tracing::debug!(
            agents = manifest.agents.len(),
            path = %path.display(),
            "Crew manifest loaded"
        );
        Ok(manifest)
    }

    /// Check names and dependency references.
    ///
    /// Cycles are left to the scheduler, which reports them with the
    /// offending path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::ValidationError("crew has no agents".into()));
        }

        let mut names = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ConfigError::ValidationError("agent name must not be empty".into()));
            }
            if !names.insert(agent.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate agent name '{}'",
                    agent.name
                )));
            }
            if agent.max_rounds == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "agent '{}': max_rounds must be > 0",
                    agent.name
                )));
            }
        }

        for agent in &self.agents {
            if let Some(missing) = agent.depends_on.iter().find(|d| !names.contains(d.as_str())) {
                return Err(ConfigError::ValidationError(format!(
                    "agent '{}' depends on unknown agent '{}'",
                    agent.name, missing
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const POEM_CREW: &str = r#"
[[agents]]
name = "poet"
backstory = "You are a well-known poet."
task = "Write a poem about the meaning of life."
expected_output = "Just the poem"

[[agents]]
name = "translator"
backstory = "You are a translator from English to Spanish."
task = "Translate the poem into Spanish."
depends_on = ["poet"]
max_rounds = 3

[[agents]]
name = "guide"
backstory = "You are a travel guide."
task = "Suggest where to read the poem outdoors."
tools = ["get_weather"]
depends_on = ["translator"]
"#;

    #[test]
    fn parses_agents_in_order() {
        let manifest: CrewManifest = toml::from_str(POEM_CREW).unwrap();
        manifest.validate().unwrap();
        let names: Vec<_> = manifest.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["poet", "translator", "guide"]);
        assert_eq!(manifest.agents[1].depends_on, ["poet"]);
        assert_eq!(manifest.agents[1].max_rounds, Some(3));
        assert_eq!(manifest.agents[2].tools, ["get_weather"]);
        assert!(manifest.agents[1].expected_output.is_empty());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{POEM_CREW}").unwrap();
        let manifest = CrewManifest::load_from(file.path()).unwrap();
        assert_eq!(manifest.agents.len(), 3);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = CrewManifest::load_from(Path::new("/nonexistent/crew.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn unknown_dependency_rejected() {
        let manifest: CrewManifest = toml::from_str(
            r#"
[[agents]]
name = "a"
backstory = "b"
task = "t"
depends_on = ["ghost"]
"#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let manifest: CrewManifest = toml::from_str(
            r#"
[[agents]]
name = "a"
backstory = "b"
task = "t"

[[agents]]
name = "a"
backstory = "c"
task = "u"
"#,
        )
        .unwrap();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn empty_manifest_rejected() {
        assert!(CrewManifest::default().validate().is_err());
    }
}
