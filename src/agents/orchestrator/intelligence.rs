//! Trip intelligence - advisory, weather, events and discovery for one destination.

use async_trait::async_trait;
use serde_json::Value;

use crate::agents::leaf::UNKNOWN_DESTINATION;
use crate::agents::{
    routes_resolve, Agent, AgentId, AgentKind, AgentRef, AggregationPolicy, Marker, MergeAll, Outcome,
    RuntimeContext,
};
use crate::task::TaskSpec;

const FORECAST_DAYS: u64 = 7;
const DEFAULT_BUDGET: f64 = 2000.0;
const DEFAULT_STYLE: &str = "cultural";

const ADVISORY: usize = 0;
const WEATHER: usize = 1;
const EVENTS: usize = 2;
const DISCOVERY: usize = 3;

/// Composite over `[advisory, weather, events]` and an optional discovery leaf.
///
/// Every child gets its own copy of `destination`; results are merged
/// under one slot per marker so a failing scanner leaves its slot empty
/// instead of sinking the whole report.
pub struct TripIntelligenceAgent {
    id: AgentId,
    children: Vec<AgentRef>,
    policy: MergeAll,
}

impl TripIntelligenceAgent {
    pub fn new(advisory: AgentRef, weather: AgentRef, events: AgentRef) -> Self {
        Self {
            id: AgentId::new(),
            children: vec![advisory, weather, events],
            policy: MergeAll::new(Marker::Intelligence)
                .slot(Marker::Advisory, "advisory")
                .slot(Marker::Weather, "weather")
                .slot(Marker::Events, "events")
                .slot(Marker::Discovery, "discovery"),
        }
    }

    /// Add destination discovery as the fourth child.
    pub fn with_discovery(mut self, discovery: AgentRef) -> Self {
        self.children.truncate(DISCOVERY);
        self.children.push(discovery);
        self
    }

    fn has_discovery(&self) -> bool {
        self.children.len() > DISCOVERY
    }
}

#[async_trait]
impl Agent for TripIntelligenceAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "TripIntelligenceAgent"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Composite
    }

    fn capabilities(&self) -> &[&'static str] {
        &["trip_intelligence"]
    }

    fn children(&self) -> &[AgentRef] {
        &self.children
    }

    fn decompose(&self, task: &TaskSpec) -> Vec<TaskSpec> {
        let destination = task
            .get("destination")
            .cloned()
            .unwrap_or_else(|| Value::from(UNKNOWN_DESTINATION));
        let base = || TaskSpec::new().with("destination", destination.clone());

        let mut events = base();
        for key in ["start_date", "end_date"] {
            if let Some(date) = task.get(key) {
                events.insert(key, date.clone());
            }
        }

        let mut subtasks = vec![
            base().routed_to(ADVISORY),
            base().with("days", FORECAST_DAYS).routed_to(WEATHER),
            events.routed_to(EVENTS),
        ];

        if self.has_discovery() {
            let mut discovery = base()
                .with("budget", task.f64("budget").unwrap_or(DEFAULT_BUDGET))
                .with("travel_style", task.str("travel_style").unwrap_or(DEFAULT_STYLE));
            for key in ["interests", "visited"] {
                if let Some(value) = task.get(key) {
                    discovery.insert(key, value.clone());
                }
            }
            subtasks.push(discovery.routed_to(DISCOVERY));
        }

        debug_assert!(
            routes_resolve(self.name(), &self.children, &subtasks),
            "TripIntelligenceAgent routed past its children"
        );
        subtasks
    }

    async fn execute(&self, _task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        Outcome::failure("TripIntelligenceAgent only works through its scanners")
    }

    async fn aggregate(&self, results: Vec<Outcome>, _ctx: &RuntimeContext) -> Outcome {
        self.policy.aggregate(results)
    }

    fn description(&self) -> &str {
        "Gathers safety, weather, events and destination ideas for one trip"
    }
}
