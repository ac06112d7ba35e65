//! Advisory scanner - safety level for a destination.

use std::sync::Arc;

use async_trait::async_trait;

use super::UNKNOWN_DESTINATION;
use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::sources::{Advisory, AdvisorySource, Location};
use crate::task::TaskSpec;

impl Tagged for Advisory {
    const MARKER: Marker = Marker::Advisory;
}

/// Reads `destination`. Degrades to standard precautions when the
/// advisory service is unavailable.
pub struct AdvisoryScanner {
    id: AgentId,
    source: Arc<dyn AdvisorySource>,
}

impl AdvisoryScanner {
    pub fn new(source: Arc<dyn AdvisorySource>) -> Self {
        Self {
            id: AgentId::new(),
            source,
        }
    }

    pub async fn scan(&self, task: &TaskSpec) -> Execution {
        let Some(location) = task.str("destination").and_then(Location::parse) else {
            return Execution::degraded(
                &Advisory::fallback(UNKNOWN_DESTINATION, None),
                "Destination required for advisory lookup",
            );
        };

        match self.source.advisory(&location).await {
            Ok(advisory) => Execution::ok(&advisory),
            Err(e) => {
                tracing::warn!(destination = %location, "Advisory unavailable: {}", e);
                Execution::degraded(
                    &Advisory::fallback(&location.query, location.country_code),
                    e.to_string(),
                )
            }
        }
    }
}

#[async_trait]
impl Agent for AdvisoryScanner {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "AdvisoryScanner"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["advisory_scanning", "safety_analysis"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.scan(task).await.into()
    }

    fn description(&self) -> &str {
        "Scans government travel advisories for a destination"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{OfflineAdvisory, SourceError};

    struct Fixed;

    #[async_trait]
    impl AdvisorySource for Fixed {
        async fn advisory(&self, location: &Location) -> Result<Advisory, SourceError> {
            Ok(Advisory {
                destination: location.query.clone(),
                country_code: location.country_code.map(str::to_string),
                score: 3.8,
                level: crate::sources::level_text(3.8).to_string(),
                message: "Reconsider".into(),
                updated: None,
                source: "fixture".into(),
            })
        }
    }

    #[tokio::test]
    async fn live_advisory_is_not_degraded() {
        let scanner = AdvisoryScanner::new(Arc::new(Fixed));
        let outcome: Outcome = scanner
            .scan(&TaskSpec::new().with("destination", "Cairo"))
            .await
            .into();
        assert!(outcome.success);
        assert!(!outcome.is_degraded());
        let data = outcome.data.unwrap();
        assert_eq!(data["kind"], "advisory");
        assert_eq!(data["level"], "Reconsider travel");
        assert_eq!(data["country_code"], "EG");
    }

    #[tokio::test]
    async fn offline_degrades_to_normal_precautions() {
        let scanner = AdvisoryScanner::new(Arc::new(OfflineAdvisory));
        let outcome = scanner
            .execute(&TaskSpec::new().with("destination", "Seoul"), &RuntimeContext::default())
            .await;
        assert!(outcome.success);
        assert!(outcome.is_degraded());
        let data = outcome.data.unwrap();
        assert_eq!(data["score"], 2.0);
        assert_eq!(data["destination"], "Seoul");
        assert!(data["note"].as_str().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn missing_destination_still_yields_payload() {
        let scanner = AdvisoryScanner::new(Arc::new(OfflineAdvisory));
        let outcome = scanner
            .execute(&TaskSpec::new().with("destination", 42), &RuntimeContext::default())
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["destination"], UNKNOWN_DESTINATION);
    }
}
