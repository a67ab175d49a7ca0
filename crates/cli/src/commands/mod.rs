pub mod ask;
pub mod config_cmd;
pub mod crew;
pub mod react;
pub mod reflect;
pub mod tool;
pub mod tools;

use crewflow_agent::AgentFactory;
use crewflow_config::AppConfig;
use std::path::Path;

/// Load the config file (explicit path or the default location) and apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)?;
            config.apply_env();
            config
        }
        None => AppConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

/// Resolve the default provider and wrap it in an agent factory.
pub fn factory(config: &AppConfig) -> Result<AgentFactory, Box<dyn std::error::Error>> {
    // Local backends don't need a key
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export GROQ_API_KEY=gsk_...      (default provider)");
        eprintln!("    export OPENAI_API_KEY=sk-...     (with CREWFLOW_PROVIDER=openai)");
        eprintln!("    export CREWFLOW_API_KEY=...      (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let route = crewflow_providers::build_from_config(config).default_route()?;
    Ok(AgentFactory::from_config(route.provider, config).with_model(route.model))
}
