//! `crewflow crew`: build a crew from a manifest and run it.

use crewflow_config::{AppConfig, CrewManifest};
use std::path::Path;
use tracing::info;

pub async fn run(
    config: &AppConfig,
    path: &Path,
    concurrent: bool,
    dot: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = CrewManifest::load_from(path)?;
    info!(manifest = %path.display(), agents = manifest.agents.len(), "Crew manifest loaded");
    let crew = super::factory(config)?.build_crew(&manifest)?;

    if dot {
        println!("{}", crew.to_dot());
    }

    let outcome = if concurrent || config.crew.concurrent {
        crew.run_concurrent().await?
    } else {
        crew.run().await?
    };

    for result in &outcome.results {
        println!("══ {} ══", result.name);
        println!("{}", result.output);
        println!();
    }
    Ok(())
}
