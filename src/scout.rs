//! Travel Scout facade - builds the agent tree and drives it.
//!
//! ```text
//! Config ──► Collaborators ──► TravelScout
//!                                 ├── trips   (TripStore)
//!                                 ├── visits  (history document)
//!                                 ├── profile (ProfileStore)
//!                                 └── tree    (TravelDigestAgent)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use crate::agents::leaf::{
    AdvisoryScanner, BudgetAnalysis, DestinationDiscovery, EventDiscovery, RecommendationGenerator,
    TravelHistory, WeatherScanner, ADD_LOCATION, HISTORY_FILE,
};
use crate::agents::orchestrator::{TravelDigestAgent, TripIntelligenceAgent};
use crate::agents::{run, AgentRef, AgentTreeNode, Outcome, RuntimeContext};
use crate::config::Config;
use crate::llm::{OpenRouterClient, RetryConfig};
use crate::sources::{
    AdvisorySource, CostSource, CostTable, DocumentStore, EventSource, JsonDocumentStore, LlmTextGenerator,
    OfflineAdvisory, OfflineEvents, OfflineWeather, PredictHqClient, ProfileStore, RetryPolicy, StoreError,
    TextGenerator, TravelAdvisoryClient, TripStore, UnconfiguredGenerator, WeatherApiClient, WeatherSource,
    TRIPS_FILE,
};
use crate::task::{TaskSpec, Trip, UserProfile, Visit};
use crate::util::dedup_trimmed;

#[derive(Debug, Error)]
pub enum ScoutError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid trip: {0}")]
    InvalidTrip(String),
}

/// Everything the tree talks to outside the process.
#[derive(Clone)]
pub struct Collaborators {
    pub weather: Arc<dyn WeatherSource>,
    pub advisory: Arc<dyn AdvisorySource>,
    pub events: Arc<dyn EventSource>,
    pub costs: Arc<dyn CostSource>,
    pub generator: Arc<dyn TextGenerator>,
    pub history: Arc<dyn DocumentStore<Visit>>,
    pub trips: Arc<dyn DocumentStore<Trip>>,
    pub profile: ProfileStore,
}

impl Collaborators {
    /// Real clients where a key is configured, offline fallbacks elsewhere.
    pub fn from_config(config: &Config) -> Self {
        let retry = RetryPolicy::with_retries(config.retry_attempts);
        let mut collaborators = Self::offline(&config.data_dir);

        if let Some(key) = &config.openrouter_api_key {
            let client = OpenRouterClient::with_base_url(key.clone(), config.openrouter_base_url.clone())
                .with_retry_config(RetryConfig {
                    max_retries: config.retry_attempts,
                    ..RetryConfig::default()
                });
            collaborators.generator = Arc::new(LlmTextGenerator::new(Arc::new(client), config.model.clone()));
        } else {
            tracing::info!("OPENROUTER_API_KEY not set; recommendations use canned text");
        }

        if config.offline {
            tracing::info!("Offline mode: every data source uses its fallback");
            return collaborators;
        }

        collaborators.advisory = Arc::new(TravelAdvisoryClient::new(config.advisory_url.clone(), retry));
        match &config.weatherapi_key {
            Some(key) => collaborators.weather = Arc::new(WeatherApiClient::new(key.clone(), retry)),
            None => tracing::info!("WEATHERAPI_KEY not set; forecasts use placeholders"),
        }
        match &config.predicthq_api_key {
            Some(key) => collaborators.events = Arc::new(PredictHqClient::new(key.clone(), retry)),
            None => tracing::info!("PREDICTHQ_API_KEY not set; events use samples"),
        }

        collaborators
    }

    /// Fallbacks for every data source, JSON stores under `data_dir`.
    pub fn offline(data_dir: &Path) -> Self {
        Self {
            weather: Arc::new(OfflineWeather),
            advisory: Arc::new(OfflineAdvisory),
            events: Arc::new(OfflineEvents),
            costs: Arc::new(CostTable::builtin()),
            generator: Arc::new(UnconfiguredGenerator),
            history: Arc::new(JsonDocumentStore::<Visit>::new(data_dir.join(HISTORY_FILE))),
            trips: Arc::new(JsonDocumentStore::<Trip>::new(data_dir.join(TRIPS_FILE))),
            profile: ProfileStore::open(data_dir),
        }
    }
}

/// The assembled tree plus the stores feeding it.
pub struct TravelScout {
    tree: AgentRef,
    history: AgentRef,
    visits: Arc<dyn DocumentStore<Visit>>,
    trips: TripStore,
    profile: ProfileStore,
    max_concurrency: usize,
}

impl TravelScout {
    pub fn new(collaborators: Collaborators, max_concurrency: usize) -> Self {
        let intelligence = TripIntelligenceAgent::new(
            Arc::new(AdvisoryScanner::new(collaborators.advisory)),
            Arc::new(WeatherScanner::new(collaborators.weather)),
            Arc::new(EventDiscovery::new(collaborators.events)),
        )
        .with_discovery(Arc::new(DestinationDiscovery::new()));

        let visits = Arc::clone(&collaborators.history);
        let history: AgentRef = Arc::new(TravelHistory::new(
            collaborators.history,
            Arc::clone(&collaborators.generator),
        ));

        let tree: AgentRef = Arc::new(TravelDigestAgent::new(
            Arc::clone(&history),
            Arc::new(intelligence),
            Arc::new(BudgetAnalysis::new(collaborators.costs)),
            Arc::new(RecommendationGenerator::new(collaborators.generator)),
        ));

        Self {
            tree,
            history,
            visits,
            trips: TripStore::new(collaborators.trips),
            profile: collaborators.profile,
            max_concurrency,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Collaborators::from_config(config), config.max_concurrency)
    }

    fn context(&self) -> RuntimeContext {
        RuntimeContext::new(self.max_concurrency)
    }

    /// Snapshot of the agent tree.
    pub fn tree(&self) -> AgentTreeNode {
        AgentTreeNode::snapshot(self.tree.as_ref())
    }

    /// Validate and persist a trip.
    pub async fn add_trip(&self, trip: Trip) -> Result<Trip, ScoutError> {
        if trip.destination.trim().is_empty() {
            return Err(ScoutError::InvalidTrip("destination is empty".to_string()));
        }
        if trip.end_date < trip.start_date {
            return Err(ScoutError::InvalidTrip(format!(
                "end date {} is before start date {}",
                trip.end_date, trip.start_date
            )));
        }
        if !trip.budget.is_finite() || trip.budget < 0.0 {
            return Err(ScoutError::InvalidTrip(format!("budget {} is not a valid amount", trip.budget)));
        }
        Ok(self.trips.save_trip(trip).await?)
    }

    pub async fn upcoming_trips(&self, today: NaiveDate) -> Result<Vec<Trip>, ScoutError> {
        Ok(self.trips.upcoming(today).await?)
    }

    pub async fn profile(&self) -> Result<UserProfile, ScoutError> {
        Ok(self.profile.load().await?)
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), ScoutError> {
        Ok(self.profile.save(profile).await?)
    }

    /// Append a visit to the travel history.
    pub async fn record_visit(&self, visit: Visit) -> Outcome {
        let data = match serde_json::to_value(&visit) {
            Ok(data) => data,
            Err(e) => return Outcome::failure(format!("Failed to encode visit: {}", e)),
        };
        let task = TaskSpec::new()
            .with("action", ADD_LOCATION)
            .with("data", data);
        run(Arc::clone(&self.history), task, self.context()).await
    }

    /// Digest over the trips starting on or after `today`.
    pub async fn generate_weekly_digest(&self, today: NaiveDate) -> Result<Outcome, ScoutError> {
        let trips = self.upcoming_trips(today).await?;
        tracing::info!(trips = trips.len(), "Generating weekly digest");
        Ok(self.generate_digest_for(&trips).await)
    }

    /// Digest over an explicit list of trips.
    ///
    /// Places already in the travel history are passed on as `visited` and
    /// profile interests as `interests`, so discovery skips known places.
    pub async fn generate_digest_for(&self, trips: &[Trip]) -> Outcome {
        let trips = match serde_json::to_value(trips) {
            Ok(trips) => trips,
            Err(e) => return Outcome::failure(format!("Failed to encode trips: {}", e)),
        };
        let mut task = TaskSpec::new()
            .with("type", "weekly_digest")
            .with("upcoming_trips", trips);

        match self.visits.load().await {
            Ok(visits) => {
                let visited = dedup_trimmed(visits.into_iter().map(|v| v.name).collect());
                task.insert("visited", json!(visited));
            }
            // The history leaf reports the same failure in the digest
            Err(e) => tracing::warn!("Travel history unavailable for discovery: {}", e),
        }
        match self.profile.load().await {
            Ok(profile) => {
                let interests = dedup_trimmed(profile.interests);
                if !interests.is_empty() {
                    task.insert("interests", json!(interests));
                }
            }
            Err(e) => tracing::warn!("User profile unreadable, using travel styles: {}", e),
        }

        run(Arc::clone(&self.tree), task, self.context()).await
    }

    /// Write `digest` to `dir/digest_YYYYMMDD_HHMMSS.json`.
    pub async fn save_digest(digest: &Value, dir: &Path) -> Result<PathBuf, ScoutError> {
        let path = dir.join(format!("digest_{}.json", Utc::now().format("%Y%m%d_%H%M%S")));
        let write_err = |source| StoreError::Write {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        let body = serde_json::to_vec_pretty(digest).map_err(StoreError::from)?;
        tokio::fs::write(&path, body).await.map_err(write_err)?;

        tracing::info!(path = %path.display(), "Saved digest");
        Ok(path)
    }
}
