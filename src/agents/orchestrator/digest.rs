//! Travel digest - the root of the agent tree.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::agents::leaf::{ANALYZE_PATTERNS, GET_STATISTICS};
use crate::agents::{
    routes_resolve, run, Agent, AgentId, AgentKind, AgentRef, AggregationPolicy, Marker, MergeAll, Outcome,
    RuntimeContext, MARKER_FIELD,
};
use crate::task::TaskSpec;

const HISTORY: usize = 0;
const INTELLIGENCE: usize = 1;
const BUDGET: usize = 2;

/// Trip fields forwarded to the intelligence branch.
const TRIP_FIELDS: [&str; 7] = [
    "destination",
    "start_date",
    "end_date",
    "budget",
    "travel_style",
    "interests",
    "visited",
];

/// Traveller-wide fields applied to every trip that does not set its own.
const TRAVELLER_FIELDS: [&str; 2] = ["interests", "visited"];

/// Composite over `[history, intelligence, budget]`.
///
/// # Decomposition
/// Two history actions, then one intelligence and one budget subtask per
/// entry of `upcoming_trips`. No trips still yields the history pair.
/// Top-level `interests` and `visited` reach every intelligence subtask
/// unless the trip carries its own.
///
/// # Aggregation
/// Results are merged into `{history: {stats, patterns}, intelligence: [..],
/// budget: [..]}` and handed to the recommendation leaf, which is run as a
/// nested tree of its own rather than dispatched as a child.
pub struct TravelDigestAgent {
    id: AgentId,
    children: Vec<AgentRef>,
    recommender: AgentRef,
    policy: MergeAll,
}

impl TravelDigestAgent {
    pub fn new(history: AgentRef, intelligence: AgentRef, budget: AgentRef, recommender: AgentRef) -> Self {
        Self {
            id: AgentId::new(),
            children: vec![history, intelligence, budget],
            recommender,
            policy: MergeAll::new(Marker::Digest)
                .nested(Marker::HistoryStats, "history", "stats")
                .nested(Marker::HistoryPatterns, "history", "patterns")
                .list(Marker::Intelligence, "intelligence")
                .list(Marker::Budget, "budget"),
        }
    }

    pub fn recommender(&self) -> &AgentRef {
        &self.recommender
    }
}

#[async_trait]
impl Agent for TravelDigestAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "TravelDigestAgent"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Composite
    }

    fn capabilities(&self) -> &[&'static str] {
        &["digest_generation"]
    }

    fn children(&self) -> &[AgentRef] {
        &self.children
    }

    fn decompose(&self, task: &TaskSpec) -> Vec<TaskSpec> {
        let mut subtasks = vec![
            TaskSpec::new().with("action", GET_STATISTICS).routed_to(HISTORY),
            TaskSpec::new().with("action", ANALYZE_PATTERNS).routed_to(HISTORY),
        ];

        let trips = task
            .get("upcoming_trips")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for trip in trips.iter().filter(|t| t.is_object()) {
            let mut intelligence = TaskSpec::new();
            for key in TRIP_FIELDS {
                if let Some(value) = trip.get(key) {
                    intelligence.insert(key, value.clone());
                }
            }
            for key in TRAVELLER_FIELDS {
                match task.get(key) {
                    Some(value) if !intelligence.contains(key) => intelligence.insert(key, value.clone()),
                    _ => {}
                }
            }
            subtasks.push(intelligence.routed_to(INTELLIGENCE));
            subtasks.push(TaskSpec::new().with("trip", trip.clone()).routed_to(BUDGET));
        }

        debug_assert!(
            routes_resolve(self.name(), &self.children, &subtasks),
            "TravelDigestAgent routed past its children"
        );
        subtasks
    }

    async fn execute(&self, _task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        Outcome::failure("TravelDigestAgent only works through its children")
    }

    async fn aggregate(&self, results: Vec<Outcome>, ctx: &RuntimeContext) -> Outcome {
        let merged = self.policy.aggregate(results);
        let (Some(Value::Object(mut context)), true) = (merged.data.clone(), merged.success) else {
            return merged;
        };

        // Bookkeeping from the merge, not context for the recommender
        context.remove(MARKER_FIELD);
        let scans_completed = context.remove("scans_completed").unwrap_or(json!(0));
        let total_subtasks = context.remove("total_subtasks").unwrap_or(json!(0));
        let context = Value::Object(context);

        let recommendation = run(
            self.recommender.clone(),
            TaskSpec::new().with("context", context.clone()),
            ctx.child_context(),
        )
        .await;
        if !recommendation.success {
            tracing::warn!(
                "Recommendation failed: {}",
                recommendation.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut digest = Map::new();
        digest.insert(MARKER_FIELD.to_string(), json!(Marker::Digest));
        digest.insert("digest".to_string(), recommendation.data.unwrap_or(Value::Null));
        digest.insert("context".to_string(), context);
        digest.insert("scans_completed".to_string(), scans_completed);
        digest.insert("total_subtasks".to_string(), total_subtasks);
        digest.insert("generated_at".to_string(), json!(Utc::now()));

        tracing::info!("Digest assembled");
        Outcome::success(Value::Object(digest))
    }

    fn description(&self) -> &str {
        "Builds the weekly travel digest from history, trip intelligence and budgets"
    }
}
