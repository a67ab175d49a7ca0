//! # crewflow Core
//!
//! Domain types, traits, and error definitions for the crewflow agent
//! orchestrator. Everything else in the workspace depends inward on this
//! crate: providers implement [`Provider`], tools implement [`Tool`], and the
//! agent crate drives both through the tag protocol defined in [`protocol`].

pub mod error;
pub mod event;
pub mod history;
pub mod message;
pub mod protocol;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{CrewError, Error, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use history::{Eviction, History};
pub use message::{Message, Role};
pub use protocol::{Tag, TagContent};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{
    Arguments, FnTool, Observation, ParamType, Tool, ToolCall, ToolParam, ToolRegistry, ToolSpec,
};
