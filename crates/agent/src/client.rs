//! Model client shared by all loops: provider, model, and sampling settings.

use chrono::Utc;
use crewflow_core::event::{DomainEvent, EventBus};
use crewflow_core::history::History;
use crewflow_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use tracing::debug;

/// A provider bound to a model and sampling settings.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    event_bus: Option<Arc<EventBus>>,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            event_bus: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Publish `ResponseGenerated` events on this bus.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.event_bus.as_ref()
    }

    /// Request one completion for `history` and return its raw text.
    ///
    /// Provider failures pass through unchanged.
    pub async fn complete(&self, history: &History) -> crewflow_core::Result<String> {
        let request = ProviderRequest::new(&self.model, history.to_vec())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        debug!(
            provider = %self.provider.name(),
            model = %response.model,
            chars = response.message.content.len(),
            "Completion received"
        );

        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ResponseGenerated {
                model: response.model.clone(),
                tokens_used: response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
                timestamp: Utc::now(),
            });
        }

        Ok(response.message.content)
    }
}
