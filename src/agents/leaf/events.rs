//! Event discovery - ranked local events during a trip.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};

use super::UNKNOWN_DESTINATION;
use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::sources::{EventSource, EventsReport, Location};
use crate::task::TaskSpec;

/// Search window used when `end_date` is missing or before `start_date`.
const DEFAULT_WINDOW_DAYS: u64 = 30;

impl Tagged for EventsReport {
    const MARKER: Marker = Marker::Events;
}

/// Reads `destination`, `start_date`, `end_date`. Degrades to synthetic
/// events dated from the start date.
pub struct EventDiscovery {
    id: AgentId,
    source: Arc<dyn EventSource>,
}

impl EventDiscovery {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            id: AgentId::new(),
            source,
        }
    }

    fn window(task: &TaskSpec) -> (NaiveDate, NaiveDate) {
        let start = task
            .date("start_date")
            .unwrap_or_else(|| Utc::now().date_naive());
        let end = task
            .date("end_date")
            .filter(|end| *end >= start)
            .or_else(|| start.checked_add_days(Days::new(DEFAULT_WINDOW_DAYS)))
            .unwrap_or(start);
        (start, end)
    }

    pub async fn discover(&self, task: &TaskSpec) -> Execution {
        let (start, end) = Self::window(task);
        let Some(location) = task.str("destination").and_then(Location::parse) else {
            return Execution::degraded(
                &EventsReport::fallback(UNKNOWN_DESTINATION, start),
                "Destination required for event search",
            );
        };

        match self.source.events(&location, start, end).await {
            Ok(events) => Execution::ok(&EventsReport::new(&location.query, events)),
            Err(e) => {
                tracing::warn!(destination = %location, "Event search unavailable: {}", e);
                Execution::degraded(&EventsReport::fallback(&location.query, start), e.to_string())
            }
        }
    }
}

#[async_trait]
impl Agent for EventDiscovery {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "EventDiscovery"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["event_discovery", "activity_recommendation"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.discover(task).await.into()
    }

    fn description(&self) -> &str {
        "Finds ranked local events during the trip dates"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::sources::{Event, OfflineEvents, SourceError};

    struct Recording(Mutex<Option<(NaiveDate, NaiveDate)>>);

    #[async_trait]
    impl EventSource for Recording {
        async fn events(
            &self,
            location: &Location,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<Event>, SourceError> {
            *self.0.lock().unwrap() = Some((start, end));
            Ok(vec![Event {
                title: format!("{} Lantern Festival", location.city),
                category: "festivals".into(),
                start: start.to_string(),
                end: None,
                rank: 90,
            }])
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seoul_trip() -> TaskSpec {
        TaskSpec::new()
            .with("destination", "Seoul")
            .with("start_date", "2025-01-01")
            .with("end_date", "2025-01-10")
    }

    #[tokio::test]
    async fn offline_fallback_is_deterministic() {
        let agent = EventDiscovery::new(Arc::new(OfflineEvents));
        let ctx = RuntimeContext::default();
        let first = agent.execute(&seoul_trip(), &ctx).await;
        let second = agent.execute(&seoul_trip(), &ctx).await;
        assert!(first.success && first.is_degraded());
        assert_eq!(first.data, second.data);

        let data = first.data.unwrap();
        assert_eq!(data["kind"], "events");
        assert_eq!(data["events"][0]["start"], "2025-01-02");
    }

    #[tokio::test]
    async fn passes_trip_window_to_source() {
        let source = Arc::new(Recording(Mutex::new(None)));
        let agent = EventDiscovery::new(source.clone());
        let outcome = agent.execute(&seoul_trip(), &RuntimeContext::default()).await;
        assert!(!outcome.is_degraded());
        assert_eq!(
            *source.0.lock().unwrap(),
            Some((date("2025-01-01"), date("2025-01-10")))
        );
        assert_eq!(outcome.data.unwrap()["events"][0]["title"], "Seoul Lantern Festival");
    }

    #[tokio::test]
    async fn reversed_window_is_widened() {
        let source = Arc::new(Recording(Mutex::new(None)));
        let agent = EventDiscovery::new(source.clone());
        let task = seoul_trip().with("end_date", "2024-12-01");
        agent.execute(&task, &RuntimeContext::default()).await;
        assert_eq!(
            *source.0.lock().unwrap(),
            Some((date("2025-01-01"), date("2025-01-31")))
        );
    }

    #[tokio::test]
    async fn malformed_task_still_yields_events() {
        let agent = EventDiscovery::new(Arc::new(OfflineEvents));
        let task = TaskSpec::new()
            .with("destination", 42)
            .with("start_date", "someday")
            .with("end_date", json!({"not": "a date"}));
        let outcome = agent.execute(&task, &RuntimeContext::default()).await;
        assert!(outcome.success && outcome.is_degraded());
        let data = outcome.data.unwrap();
        assert_eq!(data["kind"], "events");
        assert_eq!(data["destination"], UNKNOWN_DESTINATION);
        assert_eq!(data["events"].as_array().unwrap().len(), 2);

        let outcome = agent.execute(&TaskSpec::new(), &RuntimeContext::default()).await;
        assert!(outcome.success && outcome.is_degraded());
    }

    #[tokio::test]
    async fn fallback_names_the_full_destination() {
        let agent = EventDiscovery::new(Arc::new(OfflineEvents));
        let task = TaskSpec::new()
            .with("destination", "Bali, Indonesia")
            .with("start_date", "2025-12-01");
        let data = agent.execute(&task, &RuntimeContext::default()).await.data.unwrap();
        assert_eq!(data["destination"], "Bali, Indonesia");
        assert_eq!(data["events"][0]["title"], "Bali Food Festival");
    }
}
