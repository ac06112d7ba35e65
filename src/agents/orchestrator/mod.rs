//! Orchestrator agents - the composites that shape the tree.
//!
//! ```text
//! TravelDigestAgent
//! ├── TravelHistory
//! ├── TripIntelligenceAgent
//! │   ├── AdvisoryScanner
//! │   ├── WeatherScanner
//! │   ├── EventDiscovery
//! │   └── DestinationDiscovery (optional)
//! └── BudgetAnalysis
//! (RecommendationGenerator runs after aggregation)
//! ```

mod digest;
mod intelligence;

pub use digest::TravelDigestAgent;
pub use intelligence::TripIntelligenceAgent;
