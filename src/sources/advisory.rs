//! Travel advisories from travel-advisory.info.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{fetch_text, http_client, AdvisorySource, Location, RetryPolicy, SourceError};

pub const TRAVEL_ADVISORY_URL: &str = "https://www.travel-advisory.info/api";

/// Score used when the advisory service cannot be reached.
pub const FALLBACK_SCORE: f64 = 2.0;

/// Safety advisory for one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// 0 (safe) to 5 (do not travel)
    pub score: f64,
    pub level: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    pub source: String,
}

impl Advisory {
    /// Deterministic standard-precautions advisory.
    pub fn fallback(destination: &str, country_code: Option<&str>) -> Self {
        Self {
            destination: destination.to_string(),
            country_code: country_code.map(str::to_string),
            score: FALLBACK_SCORE,
            level: level_text(FALLBACK_SCORE).to_string(),
            message: "Standard travel precautions apply.".to_string(),
            updated: None,
            source: "Fallback".to_string(),
        }
    }
}

/// Map a risk score to its advisory level.
pub fn level_text(score: f64) -> &'static str {
    if score < 2.5 {
        "Exercise normal precautions"
    } else if score < 3.5 {
        "Exercise increased caution"
    } else if score < 4.5 {
        "Reconsider travel"
    } else {
        "Do not travel"
    }
}

/// travel-advisory.info client. Needs no credential.
pub struct TravelAdvisoryClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl TravelAdvisoryClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    async fn fetch(&self, location: &Location, code: &str) -> Result<Advisory, SourceError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[("countrycode", code)]);
        parse_advisory(&fetch_text(request).await?, location, code)
    }
}

#[async_trait]
impl AdvisorySource for TravelAdvisoryClient {
    async fn advisory(&self, location: &Location) -> Result<Advisory, SourceError> {
        let code = location
            .country_code
            .ok_or_else(|| SourceError::UnknownLocation(location.query.clone()))?;
        self.retry
            .run("travel-advisory", move || self.fetch(location, code))
            .await
    }
}

/// Always unavailable; the advisory leaf falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisory;

#[async_trait]
impl AdvisorySource for OfflineAdvisory {
    async fn advisory(&self, _location: &Location) -> Result<Advisory, SourceError> {
        Err(SourceError::Offline("travel advisories"))
    }
}

#[derive(Debug, Deserialize)]
struct TaResponse {
    #[serde(default)]
    data: HashMap<String, TaCountry>,
}

#[derive(Debug, Deserialize)]
struct TaCountry {
    advisory: TaAdvisory,
}

#[derive(Debug, Deserialize)]
struct TaAdvisory {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

fn parse_advisory(body: &str, location: &Location, code: &str) -> Result<Advisory, SourceError> {
    let response: TaResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    let country = response
        .data
        .get(code)
        .ok_or_else(|| SourceError::UnknownLocation(location.query.clone()))?;
    let advisory = &country.advisory;

    Ok(Advisory {
        destination: location.query.clone(),
        country_code: Some(code.to_string()),
        score: advisory.score,
        level: level_text(advisory.score).to_string(),
        message: advisory
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "No advisory".to_string()),
        updated: advisory.updated.clone(),
        source: advisory
            .source
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Travel Advisory API".to_string()),
    })
}
