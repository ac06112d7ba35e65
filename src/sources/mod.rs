//! External collaborators the leaves call into.
//!
//! Every quantitative collaborator exposes one query keyed by a normalized
//! [`Location`] and has an offline implementation of the same trait. The
//! offline implementations always return an error so the calling leaf
//! applies its fallback policy; they never invent data themselves.

mod advisory;
mod ai;
mod costs;
mod events;
mod location;
mod profile;
mod retry;
mod store;
mod trips;
mod weather;

pub use advisory::{level_text, Advisory, OfflineAdvisory, TravelAdvisoryClient, TRAVEL_ADVISORY_URL};
pub use ai::{LlmTextGenerator, UnconfiguredGenerator, DEFAULT_SYSTEM_PROMPT};
pub use costs::{CostBreakdown, CostTable};
pub use events::{Event, EventsReport, OfflineEvents, PredictHqClient};
pub use location::Location;
pub use profile::{ProfileStore, PROFILE_FILE};
pub use retry::RetryPolicy;
pub use store::{DocumentStore, InMemoryStore, JsonDocumentStore, StoreError};
pub use trips::{TripStore, TRIPS_FILE};
pub use weather::{DailyForecast, Forecast, OfflineWeather, WeatherApiClient};

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

/// Timeout applied to every collaborator HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure talking to a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("{0} is unavailable in offline mode")]
    Offline(&'static str),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no data for location '{0}'")]
    UnknownLocation(String),
}

impl SourceError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Weather forecasts.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn forecast(&self, location: &Location, days: u32) -> Result<Forecast, SourceError>;
}

/// Government travel advisories.
#[async_trait]
pub trait AdvisorySource: Send + Sync {
    async fn advisory(&self, location: &Location) -> Result<Advisory, SourceError>;
}

/// Local events between two dates.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn events(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Event>, SourceError>;
}

/// Cost of living per day.
#[async_trait]
pub trait CostSource: Send + Sync {
    async fn costs(&self, location: &Location) -> Result<CostBreakdown, SourceError>;
}

/// AI text generation: single request, single response.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, SourceError>;
}

/// HTTP client with the collaborator timeout applied.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Send `request` and return the body of a 2xx response.
pub(crate) async fn fetch_text(request: reqwest::RequestBuilder) -> Result<String, SourceError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SourceError::Http {
            status: status.as_u16(),
            body: truncate(&body, 200),
        });
    }
    Ok(body)
}

/// Cut `text` to at most `max` characters, on a char boundary.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(SourceError::Timeout("t".into()).is_transient());
        assert!(SourceError::Network("n".into()).is_transient());
        assert!(SourceError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(SourceError::Http {
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!SourceError::Http {
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!SourceError::MissingCredential("WEATHERAPI_KEY").is_transient());
        assert!(!SourceError::Malformed("x".into()).is_transient());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("São Paulo", 2), "Sã...");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn missing_credential_message_names_the_variable() {
        let e = SourceError::MissingCredential("PREDICTHQ_API_KEY");
        assert_eq!(e.to_string(), "PREDICTHQ_API_KEY is not configured");
    }
}
