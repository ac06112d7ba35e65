//! Recursive runtime: decompose, fan out, join in order, aggregate.
//!
//! # Processing Flow
//! ```text
//! run(node, task)
//!   leaf       → execute (inside a concurrency slot)
//!   composite  → decompose
//!                  no subtasks / no children → execute
//!                  otherwise → route all → spawn all → join all → aggregate
//! ```

use std::sync::Arc;

use async_recursion::async_recursion;
use futures::future::join_all;
use serde_json::Value;

use super::{AgentError, AgentKind, AgentRef, Outcome, RunPhase, RuntimeContext};
use crate::task::{TaskSpec, AGENT_INDEX};

/// Tracks the phase of one `run` call and reports every transition.
struct PhaseTracker<'a> {
    agent: &'a str,
    ctx: &'a RuntimeContext,
    phase: RunPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(agent: &'a str, ctx: &'a RuntimeContext) -> Self {
        ctx.emit(agent, RunPhase::Idle);
        Self {
            agent,
            ctx,
            phase: RunPhase::Idle,
        }
    }

    fn advance(&mut self, next: RunPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal phase transition {:?} -> {:?} in '{}'",
            self.phase,
            next,
            self.agent
        );
        tracing::debug!(
            agent = self.agent,
            depth = self.ctx.depth(),
            from = ?self.phase,
            to = ?next,
            "phase transition"
        );
        self.phase = next;
        self.ctx.emit(self.agent, next);
    }
}

/// Run `task` on `agent`, recursing through composites.
///
/// Always yields exactly one `Outcome`. A composite either dispatches to
/// its children or executes itself, never both.
#[async_recursion]
pub async fn run(agent: AgentRef, task: TaskSpec, ctx: RuntimeContext) -> Outcome {
    let name = agent.name().to_string();
    let mut phase = PhaseTracker::new(&name, &ctx);

    let outcome = match agent.kind() {
        AgentKind::Leaf => {
            phase.advance(RunPhase::Executing);
            let _slot = ctx.acquire_slot().await;
            agent.execute(&task, &ctx).await
        }
        AgentKind::Composite => {
            phase.advance(RunPhase::Decomposing);
            let subtasks = agent.decompose(&task);

            if subtasks.is_empty() || agent.children().is_empty() {
                tracing::info!(agent = %name, "Executing directly");
                phase.advance(RunPhase::Executing);
                agent.execute(&task, &ctx).await
            } else {
                tracing::info!(
                    agent = %name,
                    subtasks = subtasks.len(),
                    "Decomposing into subtasks"
                );
                phase.advance(RunPhase::Dispatching);
                match dispatch(&name, agent.children(), subtasks, &ctx).await {
                    Ok(results) => {
                        phase.advance(RunPhase::Aggregating);
                        agent.aggregate(results, &ctx).await
                    }
                    Err(e) => {
                        tracing::error!(agent = %name, "Rejected dispatch: {}", e);
                        Outcome::failure(e.to_string())
                    }
                }
            }
        }
    };

    phase.advance(RunPhase::Done);
    outcome
}

/// Resolve which child handles `task`.
///
/// A missing `agent_index` selects the first child. Anything that is not
/// an in-range non-negative integer is a contract violation; it is never
/// clamped.
pub fn route(agent: &str, children: &[AgentRef], task: &TaskSpec) -> Result<usize, AgentError> {
    let index = match task.agent_index() {
        None => 0,
        Some(Value::Number(n)) => match n.as_u64().and_then(|i| usize::try_from(i).ok()) {
            Some(i) => i,
            None => {
                return Err(AgentError::MalformedRoute {
                    agent: agent.to_string(),
                    value: n.to_string(),
                })
            }
        },
        Some(other) => {
            return Err(AgentError::MalformedRoute {
                agent: agent.to_string(),
                value: other.to_string(),
            })
        }
    };

    if index >= children.len() {
        return Err(AgentError::InvalidRoute {
            agent: agent.to_string(),
            index,
            children: children.len(),
        });
    }
    Ok(index)
}

/// Whether every subtask in a batch resolves to one of `children`.
pub fn routes_resolve(agent: &str, children: &[AgentRef], subtasks: &[TaskSpec]) -> bool {
    subtasks.iter().all(|task| route(agent, children, task).is_ok())
}

/// Launch every subtask concurrently and join them all.
///
/// # Postconditions
/// - `result[i]` corresponds to `subtasks[i]` regardless of completion order
/// - Routing is validated for the whole batch before anything is spawned;
///   one bad `agent_index` rejects the batch
/// - A subtask that panics becomes a failed `Outcome` in its own position
pub async fn dispatch(
    agent: &str,
    children: &[AgentRef],
    subtasks: Vec<TaskSpec>,
    ctx: &RuntimeContext,
) -> Result<Vec<Outcome>, AgentError> {
    let routed = subtasks
        .into_iter()
        .map(|task| route(agent, children, &task).map(|index| (index, task)))
        .collect::<Result<Vec<_>, _>>()?;

    let child_ctx = ctx.child_context();
    let handles = routed
        .into_iter()
        .map(|(index, mut task)| {
            task.remove(AGENT_INDEX);
            let child = Arc::clone(&children[index]);
            let child_name = child.name().to_string();
            let handle = tokio::spawn(run(child, task, child_ctx.clone()));
            (child_name, handle)
        })
        .collect::<Vec<_>>();

    let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let joined = join_all(handles).await;

    Ok(joined
        .into_iter()
        .zip(names)
        .map(|(result, child_name)| {
            result.unwrap_or_else(|e| {
                tracing::error!(agent = %child_name, "Subtask aborted: {}", e);
                Outcome::failure(
                    AgentError::Aborted {
                        agent: child_name,
                        reason: e.to_string(),
                    }
                    .to_string(),
                )
            })
        })
        .collect())
}
