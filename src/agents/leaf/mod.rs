//! Leaf agents - each wraps one collaborator and turns a task into exactly
//! one outcome.
//!
//! # Failure policy
//! Fixed per leaf type:
//!
//! | Leaf | Capability | Marker | Collaborator failure |
//! |---|---|---|---|
//! | `AdvisoryScanner` | `advisory_scanning` | `advisory` | degraded fallback |
//! | `WeatherScanner` | `weather_forecasting` | `weather` | degraded fallback |
//! | `EventDiscovery` | `event_discovery` | `events` | degraded fallback |
//! | `BudgetAnalysis` | `budget_tracking` | `budget` | failed outcome |
//! | `TravelHistory` | `history_tracking` | `history_*` | failed outcome |
//! | `DestinationDiscovery` | `destination_discovery` | `discovery` | failed outcome |
//! | `RecommendationGenerator` | `ai_generation` | `recommendation` | degraded canned text |

mod advisory;
mod budget;
mod discovery;
mod events;
mod history;
mod recommendation;
mod weather;

pub use advisory::AdvisoryScanner;
pub use budget::{BudgetAnalysis, BudgetReport};
pub use discovery::{DestinationDiscovery, DiscoveryReport};
pub use events::EventDiscovery;
pub use history::{
    HistoryPatterns, HistoryStats, TravelHistory, ADD_LOCATION, ANALYZE_PATTERNS, GET_STATISTICS,
    HISTORY_FILE,
};
pub use recommendation::{Recommendation, RecommendationGenerator};
pub use weather::WeatherScanner;

/// Destination reported when a task names none.
pub const UNKNOWN_DESTINATION: &str = "Unknown";
