//! Agents module - recursive decompose/dispatch/aggregate runtime.
//!
//! # Agent Types
//! - **Leaf**: turns one task into one [`Outcome`] by calling a collaborator
//! - **Composite**: decomposes a task into subtasks, fans them out to its
//!   children concurrently, and aggregates what comes back
//!
//! # Execution
//! [`run`] is the single entry point. It is recursive: a composite's
//! children may themselves be composites. Results are joined in submission
//! order, and no subtask's failure cancels its siblings.

mod aggregate;
mod context;
mod runtime;
mod tree;
mod types;
pub mod leaf;
pub mod orchestrator;

pub use aggregate::{AggregationPolicy, MergeAll, Placement, SuccessesOnly};
pub use context::{RunEvent, RunPhase, RuntimeContext};
pub use runtime::{dispatch, route, routes_resolve, run};
pub use tree::AgentTreeNode;
pub use types::{
    AgentError, AgentId, AgentKind, Execution, Marker, Outcome, Tagged, MARKER_FIELD, NOTE_FIELD,
};

use std::sync::Arc;

use async_trait::async_trait;

use crate::task::TaskSpec;

/// Reference to an agent in the tree.
pub type AgentRef = Arc<dyn Agent>;

/// Base trait for all agents.
///
/// # Invariants
/// - `execute()` never panics and never returns an error; every failure is
///   an `Outcome` with `success == false` or a degraded payload
/// - `decompose()` is pure
/// - A leaf's `children()` is empty
#[async_trait]
pub trait Agent: Send + Sync {
    /// Get the unique identifier for this agent.
    fn id(&self) -> &AgentId;

    /// Name used in logs and tree snapshots.
    fn name(&self) -> &str;

    /// Leaf or composite, fixed at construction.
    fn kind(&self) -> AgentKind;

    /// Declared capabilities. Advisory only; dispatch does not check them.
    fn capabilities(&self) -> &[&'static str];

    /// Ordered, exclusively owned children.
    fn children(&self) -> &[AgentRef] {
        &[]
    }

    /// Map one task into subtasks, each optionally routed with `agent_index`.
    ///
    /// # Postconditions
    /// - No side effects
    /// - Every `agent_index` produced addresses one of `children()`
    fn decompose(&self, _task: &TaskSpec) -> Vec<TaskSpec> {
        Vec::new()
    }

    /// Execute the task directly.
    async fn execute(&self, task: &TaskSpec, ctx: &RuntimeContext) -> Outcome;

    /// Fold child outcomes, positionally aligned with `decompose()`'s output.
    ///
    /// Defaults to [`SuccessesOnly`].
    async fn aggregate(&self, results: Vec<Outcome>, _ctx: &RuntimeContext) -> Outcome {
        SuccessesOnly.aggregate(results)
    }

    /// Get a human-readable description of this agent.
    fn description(&self) -> &str {
        "Generic agent"
    }
}
