//! Agent loops and crew scheduling.
//!
//! An agent sends its history to a completion backend, reads the tagged
//! reply, and either answers or calls tools and loops:
//!
//! 1. **Render** the system prompt with the registered tool signatures
//! 2. **Complete** the history via the configured provider
//! 3. **If `<response>`**: return it
//! 4. **If `<tool_call>`s**: validate, dispatch, append one `<observation>`, loop back to 2
//!
//! The loop ends on a response or when the round budget runs out. A [`Crew`]
//! runs several agents in dependency order and feeds each one the outputs of
//! its upstream agents.

pub mod agent;
pub mod client;
pub mod crew;
pub mod factory;
pub mod patterns;
pub mod prompts;
pub mod trace;

pub use agent::Agent;
pub use client::ModelClient;
pub use crew::{Crew, CrewBuilder, CrewOutcome, NodeId, NodeResult};
pub use factory::{AgentFactory, AgentKind, AnyAgent};
pub use patterns::{
    CritiqueRecord, ReactAgent, ReactOutcome, ReflectionAgent, ReflectionOutcome, StopCondition,
    ToolAgent, ToolAgentOutcome,
};
pub use trace::{Trace, TraceEntry, TraceKind};
