//! `crewflow config`: configuration management commands.

use crewflow_config::AppConfig;
use std::path::Path;

const REDACTED: &str = "***";

pub async fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some(REDACTED.into());
    }
    for provider in shown.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}

pub async fn init(path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::config_dir().join("config.toml"),
    };

    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote {}", path.display());
    Ok(())
}
