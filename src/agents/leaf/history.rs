//! Travel history - records visits and summarizes them.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::sources::{DocumentStore, JsonDocumentStore, TextGenerator, DEFAULT_SYSTEM_PROMPT};
use crate::task::{TaskSpec, Visit};

pub const HISTORY_FILE: &str = "travel_history.json";

pub const ADD_LOCATION: &str = "add_location";
pub const GET_STATISTICS: &str = "get_statistics";
pub const ANALYZE_PATTERNS: &str = "analyze_patterns";

const NO_HISTORY: &str = "No travel history yet.";
const PATTERNS_UNAVAILABLE: &str =
    "Pattern analysis is unavailable right now. Your recorded destinations are listed in the statistics.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub total_destinations: usize,
    pub unique_countries: usize,
    /// Sorted
    pub countries_list: Vec<String>,
}

impl Tagged for HistoryStats {
    const MARKER: Marker = Marker::HistoryStats;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPatterns {
    pub patterns: String,
}

impl Tagged for HistoryPatterns {
    const MARKER: Marker = Marker::HistoryPatterns;
}

impl Tagged for Visit {
    const MARKER: Marker = Marker::HistoryEntry;
}

/// Dispatches on the task's `action` field.
pub struct TravelHistory {
    id: AgentId,
    store: Arc<dyn DocumentStore<Visit>>,
    generator: Arc<dyn TextGenerator>,
}

impl TravelHistory {
    pub fn new(store: Arc<dyn DocumentStore<Visit>>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            id: AgentId::new(),
            store,
            generator,
        }
    }

    /// History kept in `travel_history.json` under `data_dir`.
    pub fn open(data_dir: &Path, generator: Arc<dyn TextGenerator>) -> Self {
        let store = JsonDocumentStore::<Visit>::new(data_dir.join(HISTORY_FILE));
        Self::new(Arc::new(store), generator)
    }

    pub async fn handle(&self, task: &TaskSpec) -> Execution {
        match task.str("action") {
            Some(ADD_LOCATION) => self.add_location(task).await,
            Some(GET_STATISTICS) => self.statistics().await,
            Some(ANALYZE_PATTERNS) => self.analyze_patterns().await,
            Some(other) => Execution::failed(format!("Unknown action: {}", other)),
            None => Execution::failed("Unknown action: none given"),
        }
    }

    async fn add_location(&self, task: &TaskSpec) -> Execution {
        let Some(visit) = task.get_as::<Visit>("data") else {
            return Execution::failed("add_location requires a 'data' object with a name");
        };
        match self.store.append(visit.clone()).await {
            Ok(()) => {
                tracing::info!(name = %visit.name, "Recorded visit");
                Execution::ok(&visit)
            }
            Err(e) => Execution::failed(e.to_string()),
        }
    }

    async fn statistics(&self) -> Execution {
        let visits = match self.store.load().await {
            Ok(visits) => visits,
            Err(e) => return Execution::failed(e.to_string()),
        };
        let countries: BTreeSet<String> = visits.iter().filter_map(|v| v.country.clone()).collect();

        Execution::ok(&HistoryStats {
            total_destinations: visits.len(),
            unique_countries: countries.len(),
            countries_list: countries.into_iter().collect(),
        })
    }

    async fn analyze_patterns(&self) -> Execution {
        let visits = match self.store.load().await {
            Ok(visits) => visits,
            Err(e) => return Execution::failed(e.to_string()),
        };
        if visits.is_empty() {
            return Execution::ok(&HistoryPatterns {
                patterns: NO_HISTORY.to_string(),
            });
        }

        let listing = match serde_json::to_string_pretty(&visits) {
            Ok(listing) => listing,
            Err(e) => return Execution::failed(format!("Failed to encode history: {}", e)),
        };
        let prompt = format!(
            "Analyze these travel patterns briefly:\n{}\n\n\
             Identify: preferred destination types, travel frequency, notable preferences.",
            listing
        );

        match self.generator.generate(&prompt, DEFAULT_SYSTEM_PROMPT).await {
            Ok(patterns) => Execution::ok(&HistoryPatterns { patterns }),
            Err(e) => {
                tracing::warn!("Pattern analysis unavailable: {}", e);
                Execution::degraded(
                    &HistoryPatterns {
                        patterns: PATTERNS_UNAVAILABLE.to_string(),
                    },
                    e.to_string(),
                )
            }
        }
    }
}

#[async_trait]
impl Agent for TravelHistory {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "TravelHistory"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["history_tracking", "pattern_analysis"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.handle(task).await.into()
    }

    fn description(&self) -> &str {
        "Records visited places and analyzes travel patterns"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::sources::{InMemoryStore, SourceError, UnconfiguredGenerator};

    /// Returns a fixed reply and keeps the prompts it saw.
    struct Scripted {
        reply: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str, _system_prompt: &str) -> Result<String, SourceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.to_string())
        }
    }

    fn visits() -> Vec<Visit> {
        vec![
            Visit::new("Kyoto", "Japan"),
            Visit::new("Lima", "Peru"),
            Visit::new("Tokyo", "Japan"),
        ]
    }

    fn ctx() -> RuntimeContext {
        RuntimeContext::default()
    }

    fn action(name: &str) -> TaskSpec {
        TaskSpec::new().with("action", name)
    }

    #[tokio::test]
    async fn statistics_count_unique_countries() {
        let agent = TravelHistory::new(
            Arc::new(InMemoryStore::with_records(visits())),
            Arc::new(UnconfiguredGenerator),
        );
        let data = agent.execute(&action(GET_STATISTICS), &ctx()).await.data.unwrap();
        assert_eq!(data["kind"], "history_stats");
        assert_eq!(data["total_destinations"], 3);
        assert_eq!(data["unique_countries"], 2);
        assert_eq!(data["countries_list"], json!(["Japan", "Peru"]));
    }

    #[tokio::test]
    async fn empty_history_has_fixed_patterns() {
        let agent = TravelHistory::new(Arc::new(InMemoryStore::<Visit>::new()), Arc::new(UnconfiguredGenerator));
        let outcome = agent.execute(&action(ANALYZE_PATTERNS), &ctx()).await;
        assert!(outcome.success);
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.data.unwrap()["patterns"], NO_HISTORY);
    }

    #[tokio::test]
    async fn patterns_prompt_includes_history() {
        let generator = Arc::new(Scripted {
            reply: "Prefers East Asia",
            prompts: Mutex::new(Vec::new()),
        });
        let agent = TravelHistory::new(Arc::new(InMemoryStore::with_records(visits())), generator.clone());
        let data = agent.execute(&action(ANALYZE_PATTERNS), &ctx()).await.data.unwrap();
        assert_eq!(data["patterns"], "Prefers East Asia");
        assert_eq!(data["kind"], "history_patterns");

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("Kyoto"));
        assert!(prompts[0].contains("travel frequency"));
    }

    #[tokio::test]
    async fn generator_failure_degrades_patterns() {
        let agent = TravelHistory::new(
            Arc::new(InMemoryStore::with_records(visits())),
            Arc::new(UnconfiguredGenerator),
        );
        let outcome = agent.execute(&action(ANALYZE_PATTERNS), &ctx()).await;
        assert!(outcome.success);
        assert!(outcome.is_degraded());
        assert!(outcome.data.unwrap()["note"]
            .as_str()
            .unwrap()
            .contains("OPENROUTER_API_KEY"));
    }

    #[tokio::test]
    async fn add_location_appends_and_echoes() {
        let store = Arc::new(InMemoryStore::<Visit>::new());
        let agent = TravelHistory::new(store.clone(), Arc::new(UnconfiguredGenerator));
        let task = action(ADD_LOCATION).with(
            "data",
            json!({"name": "Nairobi", "country": "Kenya", "visit_date": "2024-06-01", "rating": 5}),
        );
        let outcome = agent.execute(&task, &ctx()).await;
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["kind"], "history_entry");

        let stored = store.load().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].rating, Some(5));
    }

    #[tokio::test]
    async fn add_location_without_data_fails() {
        let agent = TravelHistory::new(Arc::new(InMemoryStore::<Visit>::new()), Arc::new(UnconfiguredGenerator));
        let outcome = agent.execute(&action(ADD_LOCATION), &ctx()).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn unknown_action_fails() {
        let agent = TravelHistory::new(Arc::new(InMemoryStore::<Visit>::new()), Arc::new(UnconfiguredGenerator));
        let outcome = agent.execute(&action("teleport"), &ctx()).await;
        assert_eq!(outcome.error.as_deref(), Some("Unknown action: teleport"));
    }

    #[tokio::test]
    async fn corrupt_history_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(HISTORY_FILE), "{not json").await.unwrap();
        let agent = TravelHistory::open(dir.path(), Arc::new(UnconfiguredGenerator));
        let outcome = agent.execute(&action(GET_STATISTICS), &ctx()).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("parse"));
    }
}
