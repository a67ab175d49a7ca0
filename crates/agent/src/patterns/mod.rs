//! Agent patterns: the loops an agent can run.
//!
//! 1. **ReAct**: Thought → Action → Observation over the tag protocol
//! 2. **Tool**: one completion to call tools, one to answer
//! 3. **Reflection**: a generator and a critic refining one artifact

pub mod react;
pub mod reflection;
pub mod tool_agent;

pub use react::{ReactAgent, ReactOutcome};
pub use reflection::{CritiqueRecord, ReflectionAgent, ReflectionOutcome, StopCondition};
pub use tool_agent::{ToolAgent, ToolAgentOutcome};

#[cfg(test)]
pub(crate) mod test_helpers;
