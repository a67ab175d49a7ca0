//! `crewflow tool`: one tool-calling completion, then one answer.

use crewflow_config::AppConfig;
use std::sync::Arc;

pub async fn run(config: &AppConfig, message: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tools = Arc::new(crewflow_tools::default_registry());
    let agent = super::factory(config)?.tool_agent(tools, None)?;

    let outcome = agent.run(message).await?;
    if !outcome.observation.is_empty() {
        eprintln!("  Observation: {}", outcome.observation.to_json());
    }
    println!("{}", outcome.answer);
    Ok(())
}
