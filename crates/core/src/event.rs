//! Domain event system: decoupled observation of agent and crew runs.
//!
//! Loops and the crew scheduler publish events as they progress. Callers that
//! want progress reporting subscribe; nobody has to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A crew node started its unit of work
    AgentStarted {
        agent: String,
        context_entries: usize,
        timestamp: DateTime<Utc>,
    },

    /// A crew node finished and pushed its output downstream
    AgentCompleted {
        agent: String,
        dependents: usize,
        output_chars: usize,
        timestamp: DateTime<Utc>,
    },

    /// The completion backend produced a reply
    ResponseGenerated {
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        call_id: i64,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A self-critique cycle finished
    CritiqueCycle {
        cycle: usize,
        stopped: bool,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
