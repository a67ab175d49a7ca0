//! `crewflow ask`: run any agent kind on one message.

use crewflow_agent::AgentKind;
use crewflow_config::AppConfig;
use std::sync::Arc;

pub async fn run(
    config: &AppConfig,
    kind: AgentKind,
    message: &str,
    system: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tools = Arc::new(crewflow_tools::default_registry());
    let agent = super::factory(config)?.create(kind, tools, system)?;

    tracing::info!(kind = %agent.kind(), "Running agent");
    println!("{}", agent.run(message).await?);
    Ok(())
}
