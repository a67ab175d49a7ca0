//! Crew: agents wired into a dependency graph and run in topological order.
//!
//! Nodes live in an arena owned by the [`Crew`] and are addressed by
//! [`NodeId`]. Each edge is one record `(upstream, downstream)`; both the
//! dependency and the dependent view of a node are derived from the same
//! records, so they always agree.
//!
//! When a node finishes, its output is pushed into the context buffer of
//! every distinct dependent as `"{name} produced:\n{output}"`. A node's
//! prompt is composed from its buffer at the moment it starts.
//!
//! ```text
//!   poet ──▶ translator ──▶ guide
//! ```

use chrono::Utc;
use crewflow_core::error::CrewError;
use crewflow_core::event::{DomainEvent, EventBus};
use crewflow_core::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::agent::Agent;

type CrewResult<T> = std::result::Result<T, CrewError>;

/// Handle of an agent inside one [`Crew`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Registration index of the node.
    pub fn index(self) -> usize {
        self.0
    }
}

struct CrewNode {
    agent: Agent,
    /// Outputs received from upstream agents during the current run.
    context: Mutex<Vec<String>>,
}

impl CrewNode {
    fn context(&self) -> Vec<String> {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn receive(&self, entry: String) {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).push(entry);
    }

    fn clear(&self) {
        self.context.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Output of one node.
#[derive(Debug, Clone)]
pub struct NodeResult {
    pub node: NodeId,
    pub name: String,
    pub output: String,
}

/// Outputs of a crew run, in completion order.
#[derive(Debug, Clone, Default)]
pub struct CrewOutcome {
    pub results: Vec<NodeResult>,
}

impl CrewOutcome {
    pub fn output_of(&self, name: &str) -> Option<&str> {
        self.results
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.output.as_str())
    }

    /// The output of the node that finished last.
    pub fn last(&self) -> Option<&NodeResult> {
        self.results.last()
    }
}

#[derive(Default)]
pub struct Crew {
    nodes: Vec<CrewNode>,
    edges: Vec<(NodeId, NodeId)>,
    event_bus: Option<Arc<EventBus>>,
}

impl Crew {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scoped builder. Agents added through it belong to the crew it
    /// builds.
    pub fn builder() -> CrewBuilder {
        CrewBuilder { crew: Self::new() }
    }

    /// Publish `AgentStarted`/`AgentCompleted` events on this bus.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    // ── Graph building ───────────────────────────────────────────────────

    /// Register an agent. Names are unique within a crew.
    pub fn add_agent(&mut self, agent: Agent) -> CrewResult<NodeId> {
        if self.find(agent.name()).is_some() {
            return Err(CrewError::DuplicateAgent(agent.name().to_string()));
        }
        let id = NodeId(self.nodes.len());
        debug!(agent = %agent.name(), node = id.0, "Agent registered");
        self.nodes.push(CrewNode {
            agent,
            context: Mutex::new(Vec::new()),
        });
        Ok(id)
    }

    /// Record that `downstream` consumes the output of `upstream`.
    pub fn add_edge(&mut self, upstream: NodeId, downstream: NodeId) -> CrewResult<&mut Self> {
        self.check(upstream)?;
        self.check(downstream)?;
        self.edges.push((upstream, downstream));
        Ok(self)
    }

    /// `node` depends on `upstream`.
    pub fn add_dependency(&mut self, node: NodeId, upstream: NodeId) -> CrewResult<&mut Self> {
        self.add_edge(upstream, node)
    }

    pub fn add_dependencies(
        &mut self,
        node: NodeId,
        upstreams: &[NodeId],
    ) -> CrewResult<&mut Self> {
        for upstream in upstreams {
            self.add_edge(*upstream, node)?;
        }
        Ok(self)
    }

    /// `downstream` depends on `node`.
    pub fn add_dependent(&mut self, node: NodeId, downstream: NodeId) -> CrewResult<&mut Self> {
        self.add_edge(node, downstream)
    }

    pub fn add_dependents(
        &mut self,
        node: NodeId,
        downstreams: &[NodeId],
    ) -> CrewResult<&mut Self> {
        for downstream in downstreams {
            self.add_edge(node, *downstream)?;
        }
        Ok(self)
    }

    fn check(&self, id: NodeId) -> CrewResult<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(CrewError::UnknownNode(id.0))
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All handles, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.agent.name() == name)
            .map(NodeId)
    }

    pub fn agent(&self, id: NodeId) -> Option<&Agent> {
        self.nodes.get(id.0).map(|n| &n.agent)
    }

    /// Snapshot of the context a node has received in the latest run.
    pub fn context(&self, id: NodeId) -> Option<Vec<String>> {
        self.nodes.get(id.0).map(CrewNode::context)
    }

    /// Distinct upstream nodes, in edge order.
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (up, down) in &self.edges {
            if *down == id && !out.contains(up) {
                out.push(*up);
            }
        }
        out
    }

    /// Distinct downstream nodes, in edge order.
    pub fn dependents_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (up, down) in &self.edges {
            if *up == id && !out.contains(down) {
                out.push(*down);
            }
        }
        out
    }

    fn name(&self, id: NodeId) -> &str {
        self.nodes[id.0].agent.name()
    }

    // ── Scheduling ───────────────────────────────────────────────────────

    fn in_degrees(&self) -> Vec<usize> {
        let mut in_degree = vec![0; self.nodes.len()];
        for (_, down) in &self.edges {
            in_degree[down.0] += 1;
        }
        in_degree
    }

    /// Topological order of the crew, ties broken by registration order.
    pub fn schedule(&self) -> CrewResult<Vec<NodeId>> {
        let mut in_degree = self.in_degrees();
        let mut queue: VecDeque<NodeId> =
            self.ids().filter(|id| in_degree[id.0] == 0).collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for (up, down) in &self.edges {
                if *up == id {
                    in_degree[down.0] -= 1;
                    if in_degree[down.0] == 0 {
                        queue.push_back(*down);
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            let unresolved: Vec<bool> = in_degree.iter().map(|d| *d > 0).collect();
            let cycle = self.find_cycle(&unresolved);
            return Err(CrewError::CyclicDependency {
                unresolved: self
                    .ids()
                    .filter(|id| unresolved[id.0])
                    .map(|id| self.name(id).to_string())
                    .collect(),
                cycle: cycle.into_iter().map(|id| self.name(id).to_string()).collect(),
            });
        }

        Ok(order)
    }

    /// One cycle among the unresolved nodes, first node repeated at the end.
    fn find_cycle(&self, unresolved: &[bool]) -> Vec<NodeId> {
        fn visit(
            crew: &Crew,
            current: NodeId,
            unresolved: &[bool],
            visited: &mut [bool],
            rec_stack: &mut Vec<NodeId>,
        ) -> Option<Vec<NodeId>> {
            visited[current.0] = true;
            rec_stack.push(current);

            for next in crew.dependents_of(current) {
                if !unresolved[next.0] {
                    continue;
                }
                if let Some(pos) = rec_stack.iter().position(|n| *n == next) {
                    let mut cycle = rec_stack[pos..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                if !visited[next.0] {
                    if let Some(cycle) = visit(crew, next, unresolved, visited, rec_stack) {
                        return Some(cycle);
                    }
                }
            }

            rec_stack.pop();
            None
        }

        let mut visited = vec![false; self.nodes.len()];
        for start in self.ids().filter(|id| unresolved[id.0]) {
            if visited[start.0] {
                continue;
            }
            let mut rec_stack = Vec::new();
            if let Some(cycle) = visit(self, start, unresolved, &mut visited, &mut rec_stack) {
                return cycle;
            }
        }
        Vec::new()
    }

    // ── Execution ────────────────────────────────────────────────────────

    /// Run every agent once, one at a time, in [`schedule`](Self::schedule)
    /// order. Nothing runs when the graph has a cycle.
    pub async fn run(&self) -> Result<CrewOutcome> {
        let order = self.schedule()?;
        self.reset_context();
        info!(agents = order.len(), "Crew run starting");

        let mut outcome = CrewOutcome::default();
        for id in order {
            let (node, output) = self.run_node(id).await;
            outcome.results.push(NodeResult {
                node,
                name: self.name(node).to_string(),
                output: output?,
            });
        }

        info!(agents = outcome.results.len(), "Crew run finished");
        Ok(outcome)
    }

    /// Run every agent once, starting each as soon as all of its
    /// dependencies have finished. Independent branches run concurrently.
    pub async fn run_concurrent(&self) -> Result<CrewOutcome> {
        self.schedule()?;
        self.reset_context();
        info!(agents = self.nodes.len(), "Concurrent crew run starting");

        let mut in_degree = self.in_degrees();
        let mut running = FuturesUnordered::new();
        for id in self.ids().filter(|id| in_degree[id.0] == 0) {
            running.push(self.run_node(id));
        }

        let mut outcome = CrewOutcome::default();
        while let Some((node, output)) = running.next().await {
            let output = output?;
            for (up, down) in &self.edges {
                if *up == node {
                    in_degree[down.0] -= 1;
                    if in_degree[down.0] == 0 {
                        running.push(self.run_node(*down));
                    }
                }
            }
            outcome.results.push(NodeResult {
                node,
                name: self.name(node).to_string(),
                output,
            });
        }

        info!(agents = outcome.results.len(), "Concurrent crew run finished");
        Ok(outcome)
    }

    /// Drop context left over from an earlier run.
    fn reset_context(&self) {
        for node in &self.nodes {
            node.clear();
        }
    }

    /// Run one node and push its output to its dependents.
    async fn run_node(&self, id: NodeId) -> (NodeId, Result<String>) {
        let node = &self.nodes[id.0];
        let name = node.agent.name();
        let context = node.context();

        info!(agent = %name, context_entries = context.len(), "Agent starting");
        self.publish(
            &node.agent,
            DomainEvent::AgentStarted {
                agent: name.to_string(),
                context_entries: context.len(),
                timestamp: Utc::now(),
            },
        );

        let output = match node.agent.run(&context).await {
            Ok(outcome) => outcome.answer,
            Err(e) => return (id, Err(e)),
        };

        let dependents = self.dependents_of(id);
        for dependent in &dependents {
            debug!(from = %name, to = %self.name(*dependent), "Passing context");
            self.nodes[dependent.0].receive(format!("{name} produced:\n{output}"));
        }

        info!(
            agent = %name,
            dependents = dependents.len(),
            output_chars = output.len(),
            "Agent finished"
        );
        self.publish(
            &node.agent,
            DomainEvent::AgentCompleted {
                agent: name.to_string(),
                dependents: dependents.len(),
                output_chars: output.len(),
                timestamp: Utc::now(),
            },
        );

        (id, Ok(output))
    }

    fn publish(&self, agent: &Agent, event: DomainEvent) {
        if let Some(bus) = self.event_bus.as_ref().or(agent.event_bus()) {
            bus.publish(event);
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    /// Graphviz DOT rendering, one node per agent and one arrow per distinct
    /// dependency.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph crew {\n    rankdir=LR;\n    node [shape=box];\n");
        for id in self.ids() {
            dot.push_str(&format!(
                "    n{} [label=\"{}\"];\n",
                id.0,
                self.name(id).replace('\\', "\\\\").replace('"', "\\\"")
            ));
        }
        for id in self.ids() {
            for down in self.dependents_of(id) {
                dot.push_str(&format!("    n{} -> n{};\n", id.0, down.0));
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Scoped crew construction. Agents added here are registered in the crew
/// returned by [`build`](Self::build).
pub struct CrewBuilder {
    crew: Crew,
}

impl CrewBuilder {
    pub fn agent(&mut self, agent: Agent) -> CrewResult<NodeId> {
        self.crew.add_agent(agent)
    }

    /// `node` depends on every one of `upstreams`.
    pub fn depends_on(&mut self, node: NodeId, upstreams: &[NodeId]) -> CrewResult<&mut Self> {
        self.crew.add_dependencies(node, upstreams)?;
        Ok(self)
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.crew.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Crew {
        self.crew
    }
}
