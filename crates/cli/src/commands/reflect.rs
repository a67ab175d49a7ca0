//! `crewflow reflect`: self-critique loop.

use crewflow_config::AppConfig;

/// Overrides of the configured reflection settings.
#[derive(Debug, Default)]
pub struct Options {
    pub cycles: Option<usize>,
    pub stop_token: Option<String>,
    pub system: Option<String>,
    pub critic: Option<String>,
}

pub async fn run(
    config: &AppConfig,
    message: &str,
    options: Options,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut agent = super::factory(config)?
        .reflection()
        .on_cycle(|record, _| {
            let preview: String = record.feedback.chars().take(72).collect();
            eprintln!("  [cycle {}] {}", record.cycle + 1, preview.replace('\n', " "));
        });

    if let Some(cycles) = options.cycles {
        agent = agent.with_max_cycles(cycles);
    }
    if let Some(token) = options.stop_token {
        agent = agent.with_stop_token(token);
    }
    if let Some(system) = options.system {
        agent = agent.with_generation_prompt(system);
    }
    if let Some(critic) = options.critic {
        agent = agent.with_reflection_prompt(critic);
    }

    let outcome = agent.run(message).await?;
    eprintln!(
        "  {} cycle(s), {}",
        outcome.trace.len(),
        if outcome.stopped { "critic satisfied" } else { "budget exhausted" }
    );
    println!("{}", outcome.final_candidate);
    Ok(())
}
