//! Error types for the crewflow domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all crewflow operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Tag protocol errors ---
    #[error("Protocol error: {reason} (payload: {payload})")]
    Protocol { payload: String, reason: String },

    // --- Crew graph errors ---
    #[error("Crew error: {0}")]
    Crew(#[from] CrewError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Failures raised while validating or dispatching a tool call.
///
/// The call-scoped variants carry the offending `call_id` so the caller can
/// tell which `<tool_call>` block in a model reply went wrong.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool '{name}' (call id {call_id})")]
    UnknownTool { call_id: i64, name: String },

    #[error("Unknown argument '{argument}' for tool '{tool}' (call id {call_id})")]
    UnknownArgument {
        call_id: i64,
        tool: String,
        argument: String,
    },

    #[error(
        "Argument '{argument}' of tool '{tool}' expected {expected}, got {value} (call id {call_id})"
    )]
    TypeMismatch {
        call_id: i64,
        tool: String,
        argument: String,
        expected: String,
        value: String,
    },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown built-in tool '{name}' (available: {available})")]
    NotBuiltin { name: String, available: String },
}

impl ToolError {
    /// The call id the error refers to, when it was raised for a specific call.
    pub fn call_id(&self) -> Option<i64> {
        match self {
            Self::UnknownTool { call_id, .. }
            | Self::UnknownArgument { call_id, .. }
            | Self::TypeMismatch { call_id, .. } => Some(*call_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CrewError {
    #[error(
        "Cyclic dependency: unresolved agents [{}], cycle {}",
        .unresolved.join(", "),
        .cycle.join(" -> ")
    )]
    CyclicDependency {
        /// Agents that could not be scheduled, in registration order
        unresolved: Vec<String>,
        /// One concrete cycle, first agent repeated at the end
        cycle: Vec<String>,
    },

    #[error("Unknown crew node: {0}")]
    UnknownNode(usize),

    #[error("Agent '{0}' is already part of this crew")]
    DuplicateAgent(String),
}
