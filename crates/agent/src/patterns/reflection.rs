//! Self-critique loop: a generator and a critic refining one artifact.
//!
//! Two pinned histories run side by side. The generator's history starts with
//! its persona and the task; the critic's starts with its persona. Each cycle
//! the candidate is shown to the critic as a user message, and the critique
//! goes back to the generator as a user message. The loop stops when the
//! stop condition holds or the cycle budget runs out, and always returns the
//! last candidate along with every cycle's record.

use chrono::Utc;
use crewflow_core::event::DomainEvent;
use crewflow_core::history::History;
use crewflow_core::message::Role;
use crewflow_core::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::client::ModelClient;
use crate::prompts;

/// Default cycle budget.
pub const DEFAULT_MAX_CYCLES: usize = 10;
/// Default capacity of each history, pinned persona included.
pub const DEFAULT_HISTORY_LENGTH: usize = 3;
/// Default substring that marks the critic as satisfied.
pub const DEFAULT_STOP_TOKEN: &str = "<SATISFIED>";

/// One generate-then-critique cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CritiqueRecord {
    /// Zero-based cycle index
    pub cycle: usize,
    pub candidate: String,
    pub feedback: String,
}

type Predicate = Box<dyn Fn(&str, &str, &[CritiqueRecord]) -> bool + Send + Sync>;
type CycleCallback = Box<dyn Fn(&CritiqueRecord, &[CritiqueRecord]) + Send + Sync>;

/// When the loop ends early.
pub enum StopCondition {
    /// The feedback contains this substring.
    Token(String),
    /// Caller-supplied test of (candidate, feedback, trace so far).
    Predicate(Predicate),
}

impl StopCondition {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &str, &[CritiqueRecord]) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Box::new(f))
    }

    fn holds(&self, candidate: &str, feedback: &str, trace: &[CritiqueRecord]) -> bool {
        match self {
            Self::Token(token) => feedback.contains(token.as_str()),
            Self::Predicate(f) => f(candidate, feedback, trace),
        }
    }
}

impl std::fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(token) => f.debug_tuple("Token").field(token).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// The result of a self-critique run.
#[derive(Debug, Clone)]
pub struct ReflectionOutcome {
    /// The last generated candidate; empty when no cycle ran.
    pub final_candidate: String,
    /// Every cycle, in order.
    pub trace: Vec<CritiqueRecord>,
    /// The stop condition fired before the budget ran out.
    pub stopped: bool,
}

pub struct ReflectionAgent {
    client: ModelClient,
    generation_prompt: String,
    reflection_prompt: String,
    history_length: usize,
    max_cycles: usize,
    stop: StopCondition,
    on_cycle: Option<CycleCallback>,
}

impl ReflectionAgent {
    pub fn new(client: ModelClient) -> Self {
        Self {
            client,
            generation_prompt: prompts::GENERATION_SYSTEM_PROMPT.into(),
            reflection_prompt: prompts::REFLECTION_SYSTEM_PROMPT.into(),
            history_length: DEFAULT_HISTORY_LENGTH,
            max_cycles: DEFAULT_MAX_CYCLES,
            stop: StopCondition::Token(DEFAULT_STOP_TOKEN.into()),
            on_cycle: None,
        }
    }

    /// Override the generator persona.
    pub fn with_generation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.generation_prompt = prompt.into();
        self
    }

    /// Override the critic persona.
    pub fn with_reflection_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.reflection_prompt = prompt.into();
        self
    }

    pub fn with_history_length(mut self, history_length: usize) -> Self {
        self.history_length = history_length;
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Stop when the feedback contains `token`.
    pub fn with_stop_token(mut self, token: impl Into<String>) -> Self {
        self.stop = StopCondition::Token(token.into());
        self
    }

    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// Called after every cycle with its record and the trace so far.
    pub fn on_cycle<F>(mut self, f: F) -> Self
    where
        F: Fn(&CritiqueRecord, &[CritiqueRecord]) + Send + Sync + 'static,
    {
        self.on_cycle = Some(Box::new(f));
        self
    }

    pub async fn run(&self, task: &str) -> Result<ReflectionOutcome> {
        self.run_with_cycles(task, self.max_cycles).await
    }

    pub async fn run_with_cycles(
        &self,
        task: &str,
        max_cycles: usize,
    ) -> Result<ReflectionOutcome> {
        let mut generation = History::pinned(self.history_length);
        generation.push(Role::System, self.generation_prompt.as_str());
        generation.push(Role::User, task);

        let mut critique = History::pinned(self.history_length);
        critique.push(Role::System, self.reflection_prompt.as_str());

        let mut trace: Vec<CritiqueRecord> = Vec::new();
        let mut final_candidate = String::new();
        let mut stopped = false;

        info!(model = %self.client.model(), max_cycles, "Self-critique loop starting");

        for cycle in 0..max_cycles {
            let candidate = self.client.complete(&generation).await?;
            generation.push(Role::Assistant, candidate.as_str());
            critique.push(Role::User, candidate.as_str());

            let feedback = self.client.complete(&critique).await?;
            generation.push(Role::User, feedback.as_str());
            critique.push(Role::Assistant, feedback.as_str());

            debug!(
                cycle,
                candidate_chars = candidate.len(),
                feedback_chars = feedback.len(),
                "Critique cycle"
            );

            trace.push(CritiqueRecord {
                cycle,
                candidate: candidate.clone(),
                feedback: feedback.clone(),
            });
            final_candidate = candidate;

            if let (Some(callback), Some(record)) = (&self.on_cycle, trace.last()) {
                callback(record, &trace);
            }

            stopped = self.stop.holds(&final_candidate, &feedback, &trace);

            if let Some(bus) = self.client.event_bus() {
                bus.publish(DomainEvent::CritiqueCycle {
                    cycle,
                    stopped,
                    timestamp: Utc::now(),
                });
            }

            if stopped {
                info!(cycles = cycle + 1, "Self-critique stop condition met");
                break;
            }
        }

        if !stopped {
            info!(cycles = trace.len(), "Self-critique budget exhausted");
        }

        Ok(ReflectionOutcome {
            final_candidate,
            trace,
            stopped,
        })
    }
}
