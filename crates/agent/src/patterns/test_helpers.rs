//! Shared test helpers for pattern and crew tests.

use crewflow_core::error::ProviderError;
use crewflow_core::message::Message;
use crewflow_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request it was given. Panics if more calls are made than
/// responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new([text])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The request of the `n`th call.
    pub fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }

    /// Contents of the messages sent with the `n`th call.
    pub fn contents(&self, n: usize) -> Vec<String> {
        self.request(n).messages.into_iter().map(|m| m.content).collect()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if requests.len() >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                requests.len(),
                responses.len()
            );
        }

        let text = responses[requests.len()].clone();
        requests.push(request);
        Ok(make_text_response(&text))
    }
}

/// A provider that always fails.
pub struct FailingProvider;

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::RateLimited { retry_after_secs: 1 })
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Render a `<tool_call>` block.
pub fn tool_call(name: &str, args: serde_json::Value, id: i64) -> String {
    format!(
        "<tool_call>{}</tool_call>",
        serde_json::json!({"name": name, "arguments": args, "id": id})
    )
}
