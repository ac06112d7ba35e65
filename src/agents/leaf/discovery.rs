//! Destination discovery - new places to visit from interest categories.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::UNKNOWN_DESTINATION;
use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::task::TaskSpec;
use crate::util::dedup_trimmed;

pub const MAX_SUGGESTIONS: usize = 5;

const DEFAULT_BUDGET: f64 = 2000.0;
const DEFAULT_INTERESTS: [&str; 2] = ["culture", "adventure"];

static CATEGORIES: [(&str, [&str; 4]); 8] = [
    ("culture", ["Kyoto", "Istanbul", "Rome", "Cairo"]),
    ("adventure", ["Patagonia", "Nepal", "Iceland", "New Zealand"]),
    ("food", ["Tokyo", "Bangkok", "Lima", "Barcelona"]),
    ("nature", ["Costa Rica", "Norway", "Tanzania", "Canada"]),
    ("history", ["Athens", "Jerusalem", "Petra", "Angkor Wat"]),
    ("nightlife", ["Berlin", "Ibiza", "Las Vegas", "Amsterdam"]),
    ("shopping", ["Dubai", "Singapore", "Milan", "Hong Kong"]),
    ("relaxation", ["Maldives", "Bali", "Santorini", "Seychelles"]),
];

fn category(interest: &str) -> Option<&'static [&'static str; 4]> {
    let interest = interest.trim().to_lowercase();
    CATEGORIES
        .iter()
        .find(|(name, _)| *name == interest)
        .map(|(_, places)| places)
}

/// Interest categories implied by a travel style.
fn style_interests(style: &str) -> Vec<String> {
    let interests: &[&str] = match style.trim().to_lowercase().as_str() {
        "cultural" | "culture" => &["culture", "history"],
        "adventure" | "adventurous" => &["adventure", "nature"],
        "food" | "foodie" | "culinary" => &["food", "culture"],
        "relaxation" | "relaxed" | "luxury" => &["relaxation", "shopping"],
        "nightlife" | "party" => &["nightlife", "food"],
        "nature" | "outdoors" => &["nature", "adventure"],
        _ => &DEFAULT_INTERESTS,
    };
    interests.iter().map(|s| s.to_string()).collect()
}

fn budget_range(budget: f64) -> &'static str {
    if budget < 1000.0 {
        "low"
    } else if budget < 3000.0 {
        "medium"
    } else {
        "high"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryReport {
    pub destination: String,
    pub based_on_interests: Vec<String>,
    pub avoiding_history: Vec<String>,
    pub budget_range: String,
    pub suggested_destinations: Vec<String>,
    pub suggestion_count: usize,
}

impl Tagged for DiscoveryReport {
    const MARKER: Marker = Marker::Discovery;
}

/// Reads `interests` (or `travel_style`), `visited`, `budget`.
pub struct DestinationDiscovery {
    id: AgentId,
}

impl DestinationDiscovery {
    pub fn new() -> Self {
        Self { id: AgentId::new() }
    }

    /// A list of strings, `Ok(None)` when absent, `Err` when anything else.
    fn string_list(task: &TaskSpec, key: &str) -> Result<Option<Vec<String>>, String> {
        match task.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| format!("'{}' must contain only strings", key))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(_) => Err(format!("'{}' must be a list of strings", key)),
        }
    }

    pub fn discover(&self, task: &TaskSpec) -> Execution {
        let interests = match Self::string_list(task, "interests") {
            Ok(Some(interests)) => dedup_trimmed(interests),
            Ok(None) => style_interests(task.str("travel_style").unwrap_or_default()),
            Err(e) => return Execution::failed(e),
        };
        let visited = match Self::string_list(task, "visited") {
            Ok(visited) => dedup_trimmed(visited.unwrap_or_default()),
            Err(e) => return Execution::failed(e),
        };
        let destination = task.str("destination").unwrap_or(UNKNOWN_DESTINATION);
        let budget = task.f64("budget").unwrap_or(DEFAULT_BUDGET);

        let mut excluded: Vec<String> = visited.iter().map(|v| v.to_lowercase()).collect();
        excluded.push(destination.to_lowercase());
        if let Some((city, _)) = destination.split_once(',') {
            excluded.push(city.trim().to_lowercase());
        }

        let mut suggested: Vec<String> = Vec::new();
        for place in interests.iter().filter_map(|i| category(i)).flatten() {
            let lowered = place.to_lowercase();
            if !excluded.contains(&lowered) && !suggested.iter().any(|s| s == place) {
                suggested.push(place.to_string());
            }
        }
        suggested.truncate(MAX_SUGGESTIONS);

        Execution::ok(&DiscoveryReport {
            destination: destination.to_string(),
            based_on_interests: interests,
            avoiding_history: visited,
            budget_range: budget_range(budget).to_string(),
            suggestion_count: suggested.len(),
            suggested_destinations: suggested,
        })
    }
}

impl Default for DestinationDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for DestinationDiscovery {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "DestinationDiscovery"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["destination_discovery"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.discover(task).into()
    }

    fn description(&self) -> &str {
        "Suggests unvisited destinations matching the traveller's interests"
    }
}
