//! Runtime context - shared state for one traversal of the agent tree.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, OwnedSemaphorePermit, Semaphore};

/// Phase of a single `run` call.
///
/// Composites move `Idle → Decomposing → Dispatching → Aggregating → Done`.
/// Leaves, and composites that decompose into nothing, move
/// `Idle → (Decomposing →) Executing → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Decomposing,
    Dispatching,
    Aggregating,
    Executing,
    Done,
}

impl RunPhase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, Decomposing)
                | (Idle, Executing)
                | (Decomposing, Dispatching)
                | (Decomposing, Executing)
                | (Dispatching, Aggregating)
                | (Dispatching, Done)
                | (Aggregating, Done)
                | (Executing, Done)
        )
    }
}

/// Phase transition observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEvent {
    pub agent: String,
    pub depth: usize,
    pub phase: RunPhase,
}

/// Context passed down the tree during one traversal.
///
/// # Thread Safety
/// Cheap to clone; every clone shares the same concurrency bound and event
/// sink. Nothing in here is mutated by agents.
#[derive(Clone)]
pub struct RuntimeContext {
    /// Bounds concurrent leaf executions across the whole traversal
    limiter: Arc<Semaphore>,

    /// Maximum permits the limiter was created with
    max_concurrency: usize,

    /// Depth of the node currently running (root = 0)
    depth: usize,

    /// Optional sink for phase transitions
    events: Option<broadcast::Sender<RunEvent>>,
}

impl RuntimeContext {
    /// Create a context allowing at most `max_concurrency` leaves to run at once.
    ///
    /// A bound of zero is raised to one so the tree can always make progress.
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            limiter: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            depth: 0,
            events: None,
        }
    }

    /// Attach an event sink.
    pub fn with_events(mut self, events: broadcast::Sender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Subscribe to phase events, creating the sink on first use.
    pub fn subscribe(&mut self) -> broadcast::Receiver<RunEvent> {
        match &self.events {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(256);
                self.events = Some(tx);
                rx
            }
        }
    }

    /// Context for the children of the current node.
    ///
    /// # Postcondition
    /// `child.depth() == self.depth() + 1`
    pub fn child_context(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            max_concurrency: self.max_concurrency,
            depth: self.depth + 1,
            events: self.events.clone(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Wait for a leaf slot. `None` only if the limiter was closed, in which
    /// case the caller proceeds unbounded.
    pub async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.limiter).acquire_owned().await.ok()
    }

    pub fn available_slots(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Emit a phase event (dropped silently when nobody listens).
    pub fn emit(&self, agent: &str, phase: RunPhase) {
        if let Some(ref events) = self.events {
            let _ = events.send(RunEvent {
                agent: agent.to_string(),
                depth: self.depth,
                phase,
            });
        }
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new(8)
    }
}
