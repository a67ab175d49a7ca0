//! Provider router: maps configured backend names to providers and models.

use std::collections::BTreeMap;
use std::sync::Arc;

use crewflow_config::AppConfig;
use crewflow_core::error::ProviderError;
use crewflow_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// A resolved backend: the provider plus the model to ask it for.
#[derive(Clone)]
pub struct Route {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Named backends with one marked as the default.
pub struct ProviderRouter {
    routes: BTreeMap<String, Route>,
    default_name: String,
}

impl ProviderRouter {
    pub fn new(default_name: impl Into<String>) -> Self {
        Self {
            routes: BTreeMap::new(),
            default_name: default_name.into(),
        }
    }

    /// Add or replace a backend.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) {
        let route = Route {
            provider,
            model: model.into(),
        };
        self.routes.insert(name.into(), route);
    }

    /// The backend called `name`, or the default one when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<Route, ProviderError> {
        let name = name.unwrap_or(self.default_name.as_str());
        self.routes
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::NotConfigured(name.to_string()))
    }

    pub fn default_route(&self) -> Result<Route, ProviderError> {
        self.resolve(None)
    }

    /// Registered backend names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.routes.keys().map(String::as_str).collect()
    }
}

/// Build the router from configuration.
///
/// Each `[providers.<name>]` table becomes an OpenAI-compatible backend. Keys
/// and models fall back to the top-level settings; the default provider is
/// registered even without its own table.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(config.default_provider.as_str());

    for (name, entry) in &config.providers {
        let api_key = entry
            .api_key
            .as_deref()
            .or(config.api_key.as_deref())
            .unwrap_or_default();
        let base_url = entry
            .api_url
            .clone()
            .unwrap_or_else(|| well_known_url(name));
        let model = entry
            .default_model
            .clone()
            .unwrap_or_else(|| config.default_model.clone());

        debug!(provider = %name, %base_url, %model, "Registering provider");
        router.register(
            name.as_str(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, api_key)),
            model,
        );
    }

    if !router.routes.contains_key(&config.default_provider) {
        let name = config.default_provider.as_str();
        let api_key = config.api_key.as_deref().unwrap_or_default();
        router.register(
            name,
            Arc::new(OpenAiCompatProvider::new(name, &well_known_url(name), api_key)),
            config.default_model.as_str(),
        );
    }

    router
}

/// Endpoint for the backends that speak the OpenAI chat API out of the box.
fn well_known_url(name: &str) -> String {
    let url = match name {
        "groq" => "https://api.groq.com/openai/v1",
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "together" => "https://api.together.xyz/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        other => return format!("https://{other}.api.example.com/v1"),
    };
    url.to_string()
}
