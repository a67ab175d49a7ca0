//! `crewflow react`: ReAct loop over the built-in tools.

use crewflow_agent::TraceKind;
use crewflow_config::AppConfig;
use std::path::Path;
use std::sync::Arc;

pub async fn run(
    config: &AppConfig,
    message: &str,
    rounds: Option<usize>,
    system: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let system_prompt = match system {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        ),
        None => None,
    };

    let tools = Arc::new(crewflow_tools::default_registry());
    let agent = super::factory(config)?.react(tools, system_prompt.as_deref());
    let rounds = rounds.unwrap_or(agent.max_rounds());

    eprint!("  Thinking...");
    let outcome = agent.run_with_rounds(message, rounds).await;
    eprint!("\r              \r");
    let outcome = outcome?;

    for entry in &outcome.trace {
        let label = match entry.kind {
            TraceKind::Thought => "Thought",
            TraceKind::Action => "Action",
            TraceKind::Observation => "Observation",
        };
        eprintln!("  {label:<12} {}", entry.content);
    }
    if outcome.exhausted {
        eprintln!("  (round budget of {rounds} exhausted)");
    }

    println!("{}", outcome.answer);
    Ok(())
}
