//! OpenAI-compatible provider implementation.
//!
//! Works with Groq, OpenAI, OpenRouter, Ollama, vLLM, and any endpoint that
//! exposes `/chat/completions`. The loops only need plain text completions;
//! tool use travels inside the text through the tag protocol.

use async_trait::async_trait;
use crewflow_core::error::ProviderError;
use crewflow_core::message::{Message, Role};
use crewflow_core::provider::{ProviderRequest, ProviderResponse, Usage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An OpenAI-compatible completion backend.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create a Groq provider (convenience constructor).
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new("groq", "https://api.groq.com/openai/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama provider (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }
}

#[async_trait]
impl crewflow_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::MalformedResponse(format!("Failed to parse response: {e}"))
            })?;

        parse_response(api_response)
    }
}

fn parse_response(api_response: ApiResponse) -> Result<ProviderResponse, ProviderError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("No choices in response".into()))?;

    let message = Message::new(Role::Assistant, choice.message.content.unwrap_or_default());

    let usage = api_response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ProviderResponse {
        message,
        usage,
        model: api_response.model,
    })
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewflow_core::Provider;

    #[test]
    fn groq_constructor() {
        let provider = OpenAiCompatProvider::groq("gsk-test");
        assert_eq!(provider.name(), "groq");
        assert!(provider.base_url().contains("api.groq.com"));
    }

    #[test]
    fn ollama_constructor() {
        let provider = OpenAiCompatProvider::ollama(None);
        assert_eq!(provider.name(), "ollama");
        assert!(provider.base_url().contains("localhost:11434"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let provider = OpenAiCompatProvider::new("custom", "http://localhost:8000/v1/", "");
        assert_eq!(provider.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn request_body_includes_max_tokens_only_when_set() {
        let request = ProviderRequest::new("llama-3.3-70b-versatile", vec![Message::user("hi")]);
        let body = OpenAiCompatProvider::request_body(&request);
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"][0]["content"], "hi");

        let body = OpenAiCompatProvider::request_body(&request.with_max_tokens(Some(64)));
        assert_eq!(body["max_tokens"], 64);
    }

    #[test]
    fn parse_first_choice() {
        let raw = r#"{
            "model": "llama-3.3-70b-versatile",
            "choices": [{"message": {"role": "assistant", "content": "<response>4</response>"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let response = parse_response(serde_json::from_str(raw).unwrap()).unwrap();
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.message.content, "<response>4</response>");
        assert_eq!(response.usage.unwrap().total_tokens, 13);
    }

    #[test]
    fn empty_choices_is_malformed() {
        let raw = r#"{"model": "m", "choices": []}"#;
        let err = parse_response(serde_json::from_str(raw).unwrap()).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let provider = OpenAiCompatProvider::new("dead", "http://127.0.0.1:1", "");
        let err = provider
            .complete(ProviderRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)));
    }
}
