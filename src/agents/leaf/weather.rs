//! Weather scanner - current conditions and a short forecast.

use std::sync::Arc;

use async_trait::async_trait;

use super::UNKNOWN_DESTINATION;
use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::sources::{Forecast, Location, WeatherSource};
use crate::task::TaskSpec;

pub const DEFAULT_DAYS: u32 = 7;
pub const MAX_DAYS: u32 = 10;

impl Tagged for Forecast {
    const MARKER: Marker = Marker::Weather;
}

/// Reads `destination` and `days` (1..=10, default 7).
///
/// Never fails: without a forecast it returns a placeholder whose
/// `condition` is always the same string.
pub struct WeatherScanner {
    id: AgentId,
    source: Arc<dyn WeatherSource>,
}

impl WeatherScanner {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self {
            id: AgentId::new(),
            source,
        }
    }

    fn days(task: &TaskSpec) -> u32 {
        task.u64("days")
            .map(|d| d.clamp(1, u64::from(MAX_DAYS)) as u32)
            .unwrap_or(DEFAULT_DAYS)
    }

    pub async fn scan(&self, task: &TaskSpec) -> Execution {
        let Some(location) = task.str("destination").and_then(Location::parse) else {
            return Execution::degraded(
                &Forecast::fallback(UNKNOWN_DESTINATION),
                "Destination required for weather",
            );
        };
        let days = Self::days(task);

        match self.source.forecast(&location, days).await {
            Ok(forecast) => Execution::ok(&forecast),
            Err(e) => {
                tracing::warn!(destination = %location, days, "Forecast unavailable: {}", e);
                Execution::degraded(&Forecast::fallback(&location.query), e.to_string())
            }
        }
    }
}

#[async_trait]
impl Agent for WeatherScanner {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "WeatherScanner"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["weather_forecasting", "climate_analysis"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.scan(task).await.into()
    }

    fn description(&self) -> &str {
        "Fetches current weather and a multi-day forecast"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::agents::{run, AgentRef};
    use crate::sources::{OfflineWeather, RetryPolicy, SourceError, WeatherApiClient};

    /// Records the day count it was asked for.
    struct Recording(Mutex<Vec<u32>>);

    #[async_trait]
    impl WeatherSource for Recording {
        async fn forecast(&self, location: &Location, days: u32) -> Result<Forecast, SourceError> {
            self.0.lock().unwrap().push(days);
            let mut forecast = Forecast::fallback(&location.query);
            forecast.condition = "Sunny".into();
            Ok(forecast)
        }
    }

    fn seoul() -> TaskSpec {
        TaskSpec::new().with("destination", "Seoul")
    }

    #[tokio::test]
    async fn offline_returns_deterministic_placeholder() {
        let agent: AgentRef = Arc::new(WeatherScanner::new(Arc::new(OfflineWeather)));
        let outcome = run(agent, seoul(), RuntimeContext::default()).await;
        assert!(outcome.success);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.data.unwrap()["condition"], "Unavailable");
    }

    #[tokio::test]
    async fn offline_calls_are_idempotent() {
        let scanner = WeatherScanner::new(Arc::new(OfflineWeather));
        let ctx = RuntimeContext::default();
        let first = scanner.execute(&seoul(), &ctx).await;
        let second = scanner.execute(&seoul(), &ctx).await;
        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades() {
        let client = WeatherApiClient::new("key", RetryPolicy::none()).with_base_url("http://127.0.0.1:9");
        let scanner = WeatherScanner::new(Arc::new(client));
        let outcome = scanner.execute(&seoul(), &RuntimeContext::default()).await;
        assert!(outcome.success);
        assert!(outcome.is_degraded());
        assert_eq!(outcome.data.unwrap()["condition"], "Unavailable");
    }

    #[tokio::test]
    async fn malformed_task_yields_placeholder() {
        let scanner = WeatherScanner::new(Arc::new(OfflineWeather));
        let task = TaskSpec::new()
            .with("destination", serde_json::json!(["not", "a", "place"]))
            .with("days", "lots");
        let outcome = scanner.execute(&task, &RuntimeContext::default()).await;
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["destination"], UNKNOWN_DESTINATION);
        assert_eq!(data["kind"], "weather");
    }

    #[tokio::test]
    async fn days_are_clamped() {
        let source = Arc::new(Recording(Mutex::new(Vec::new())));
        let scanner = WeatherScanner::new(source.clone());
        let ctx = RuntimeContext::default();
        scanner.execute(&seoul().with("days", 30), &ctx).await;
        scanner.execute(&seoul().with("days", 0), &ctx).await;
        scanner.execute(&seoul(), &ctx).await;
        assert_eq!(*source.0.lock().unwrap(), vec![10, 1, 7]);
    }

    #[tokio::test]
    async fn live_forecast_is_not_degraded() {
        let scanner = WeatherScanner::new(Arc::new(Recording(Mutex::new(Vec::new()))));
        let outcome = scanner.execute(&seoul(), &RuntimeContext::default()).await;
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.data.unwrap()["condition"], "Sunny");
    }
}
