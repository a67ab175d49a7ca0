//! Reasoning trace: what a ReAct run thought, did, and saw.
//!
//! Traces are run-scoped: every `run` starts an empty one and hands it back
//! inside the outcome for inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry in the reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub kind: TraceKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The kind of reasoning trace entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TraceKind {
    Thought,
    Action,
    Observation,
}

/// Append-only recorder for one run.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a "Thought" trace entry.
    pub fn thought(&mut self, thought: &str) {
        self.push(TraceKind::Thought, thought);
    }

    /// Record an "Action" trace entry.
    pub fn action(&mut self, action: &str) {
        self.push(TraceKind::Action, action);
    }

    /// Record an "Observation" trace entry.
    pub fn observation(&mut self, observation: &str) {
        self.push(TraceKind::Observation, observation);
    }

    fn push(&mut self, kind: TraceKind, content: &str) {
        self.entries.push(TraceEntry {
            kind,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_order() {
        let mut trace = Trace::new();
        trace.thought("need weather");
        trace.action("get_weather({\"city\":\"Paris\"})");
        trace.observation("\"Sunny, 22°C\"");
        let entries = trace.into_entries();
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [TraceKind::Thought, TraceKind::Action, TraceKind::Observation]);
    }
}
