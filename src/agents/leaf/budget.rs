//! Budget analysis - does the trip budget cover estimated local costs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::UNKNOWN_DESTINATION;
use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::sources::{CostBreakdown, CostSource, Location};
use crate::task::{inclusive_days, TaskSpec};

/// Trip length assumed when neither dates nor `duration_days` are given.
const DEFAULT_DURATION_DAYS: u32 = 7;

const TIPS: [&str; 3] = [
    "Book accommodations early for better rates",
    "Consider local transportation",
    "Look for free activities",
];

/// Feasibility of one trip's budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetReport {
    pub destination: String,
    pub budget: f64,
    pub duration_days: u32,
    pub daily_cost: f64,
    pub total_estimated: f64,
    pub remaining_budget: f64,
    /// Budget as a share of the estimate, capped at 100
    pub feasibility_percentage: f64,
    pub is_feasible: bool,
    pub breakdown: CostBreakdown,
    pub tips: Vec<String>,
}

impl Tagged for BudgetReport {
    const MARKER: Marker = Marker::Budget;
}

impl BudgetReport {
    fn new(destination: &str, budget: f64, duration_days: u32, breakdown: CostBreakdown) -> Self {
        let daily_cost = breakdown.daily;
        let total_estimated = daily_cost * f64::from(duration_days);
        let remaining_budget = budget - total_estimated;
        let feasibility = if total_estimated > 0.0 {
            (budget / total_estimated * 100.0).min(100.0)
        } else {
            100.0
        };

        Self {
            destination: destination.to_string(),
            budget,
            duration_days,
            daily_cost,
            total_estimated,
            remaining_budget,
            feasibility_percentage: (feasibility * 10.0).round() / 10.0,
            is_feasible: remaining_budget >= 0.0,
            breakdown,
            tips: TIPS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Reads a nested `trip` object, or the same fields at the top level.
pub struct BudgetAnalysis {
    id: AgentId,
    source: Arc<dyn CostSource>,
}

impl BudgetAnalysis {
    pub fn new(source: Arc<dyn CostSource>) -> Self {
        Self {
            id: AgentId::new(),
            source,
        }
    }

    /// The fields describing the trip: `trip` when it is an object, else the task itself.
    fn trip_fields(task: &TaskSpec) -> TaskSpec {
        task.get("trip")
            .cloned()
            .and_then(TaskSpec::from_value)
            .unwrap_or_else(|| task.clone())
    }

    fn duration(trip: &TaskSpec) -> u32 {
        match (trip.date("start_date"), trip.date("end_date")) {
            (Some(start), Some(end)) => inclusive_days(start, end),
            _ => trip
                .u64("duration_days")
                .and_then(|d| u32::try_from(d).ok())
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DURATION_DAYS),
        }
    }

    pub async fn analyze(&self, task: &TaskSpec) -> Execution {
        let trip = Self::trip_fields(task);

        let budget = match trip.f64("budget") {
            Some(b) if b.is_finite() && b >= 0.0 => b,
            Some(b) => return Execution::failed(format!("Budget must be a non-negative amount, got {}", b)),
            None => return Execution::failed("Trip budget is required"),
        };
        let destination = trip.str("destination").unwrap_or(UNKNOWN_DESTINATION);
        let duration = Self::duration(&trip);

        let breakdown = match Location::parse(destination) {
            Some(location) => match self.source.costs(&location).await {
                Ok(breakdown) => breakdown,
                Err(e) => {
                    tracing::warn!(destination, "Cost lookup failed: {}", e);
                    return Execution::failed(format!("Cost lookup failed for {}: {}", destination, e));
                }
            },
            None => return Execution::failed("Destination required for budget analysis"),
        };

        tracing::debug!(destination, budget, duration, daily = breakdown.daily, "Budget analyzed");
        Execution::ok(&BudgetReport::new(destination, budget, duration, breakdown))
    }
}

#[async_trait]
impl Agent for BudgetAnalysis {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "BudgetAnalysis"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["budget_tracking", "cost_optimization"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.analyze(task).await.into()
    }

    fn description(&self) -> &str {
        "Checks a trip budget against estimated local costs"
    }
}
