//! Local events from PredictHQ.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{fetch_text, http_client, EventSource, Location, RetryPolicy, SourceError};

pub const PREDICTHQ_URL: &str = "https://api.predicthq.com/v1";

/// Most events kept per destination.
pub const EVENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub category: String,
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// 0-100, higher is more significant
    #[serde(default)]
    pub rank: u32,
}

/// Events found for one destination, highest rank first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsReport {
    pub destination: String,
    pub events: Vec<Event>,
}

impl EventsReport {
    pub fn new(destination: &str, mut events: Vec<Event>) -> Self {
        events.sort_by(|a, b| b.rank.cmp(&a.rank));
        events.truncate(EVENT_LIMIT);
        Self {
            destination: destination.to_string(),
            events,
        }
    }

    /// Two synthetic events dated relative to `start`, titled after the
    /// city part of `destination`. Deterministic for given inputs.
    pub fn fallback(destination: &str, start: NaiveDate) -> Self {
        let city = destination.split(',').next().unwrap_or(destination).trim();
        let day = |offset: u64| {
            start
                .checked_add_days(Days::new(offset))
                .unwrap_or(start)
                .to_string()
        };
        Self::new(
            destination,
            vec![
                Event {
                    title: format!("{} Food Festival", city),
                    category: "festivals".to_string(),
                    start: day(1),
                    end: Some(day(3)),
                    rank: 85,
                },
                Event {
                    title: format!("{} Music Concert", city),
                    category: "concerts".to_string(),
                    start: day(4),
                    end: Some(day(4)),
                    rank: 75,
                },
            ],
        )
    }
}

/// PredictHQ events search client.
pub struct PredictHqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl PredictHqClient {
    pub fn new(api_key: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            base_url: PREDICTHQ_URL.to_string(),
            retry,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Event>, SourceError> {
        let start = start.to_string();
        let end = end.to_string();
        let limit = EVENT_LIMIT.to_string();
        let request = self
            .client
            .get(format!("{}/events/", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("q", location.city.as_str()),
                ("start.gte", start.as_str()),
                ("start.lte", end.as_str()),
                ("sort", "-rank"),
                ("limit", limit.as_str()),
            ]);
        parse_events(&fetch_text(request).await?)
    }
}

#[async_trait]
impl EventSource for PredictHqClient {
    async fn events(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Event>, SourceError> {
        if self.api_key.trim().is_empty() {
            return Err(SourceError::MissingCredential("PREDICTHQ_API_KEY"));
        }
        self.retry
            .run("predicthq", move || self.fetch(location, start, end))
            .await
    }
}

/// Always unavailable; the events leaf falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineEvents;

#[async_trait]
impl EventSource for OfflineEvents {
    async fn events(
        &self,
        _location: &Location,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<Event>, SourceError> {
        Err(SourceError::Offline("event search"))
    }
}

#[derive(Debug, Deserialize)]
struct PhqResponse {
    #[serde(default)]
    results: Vec<PhqEvent>,
}

#[derive(Debug, Deserialize)]
struct PhqEvent {
    title: String,
    #[serde(default)]
    category: String,
    start: String,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    rank: u32,
}

fn parse_events(body: &str) -> Result<Vec<Event>, SourceError> {
    let response: PhqResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    Ok(response
        .results
        .into_iter()
        .map(|e| Event {
            title: e.title,
            category: e.category,
            start: e.start,
            end: e.end,
            rank: e.rank,
        })
        .collect())
}
