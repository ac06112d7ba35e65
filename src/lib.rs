//! # Travel Scout
//!
//! Weekly travel digests built by a tree of agents.
//!
//! This library provides:
//! - A recursive decompose/dispatch/aggregate runtime for agent trees
//! - Leaf agents over travel advisories, forecasts, events, costs and AI text
//! - A digest facade that persists trips and writes digests to disk
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │        TravelDigestAgent         │
//!        └──────┬──────────┬────────────┬───┘
//!               │          │            │
//!               ▼          ▼            ▼
//!        ┌──────────┐ ┌───────────┐ ┌────────┐
//!        │ History  │ │ TripIntel │ │ Budget │
//!        └──────────┘ └─────┬─────┘ └────────┘
//!                           │
//!          advisory · weather · events · discovery
//! ```
//!
//! ## Task Flow
//! 1. Load upcoming trips, visited places and profile interests
//! 2. Decompose into history, intelligence and budget subtasks
//! 3. Run every subtask concurrently, joined in submission order
//! 4. Merge results by marker and generate the recommendation text
//!
//! ## Modules
//! - `agents`: runtime, aggregation policies, leaves and composites
//! - `task`: open task descriptions, trips and visits
//! - `sources`: collaborator traits, HTTP clients, offline fallbacks, JSON stores
//! - `llm`: OpenRouter chat client

pub mod agents;
pub mod config;
pub mod llm;
pub mod scout;
pub mod sources;
pub mod task;
pub mod util;

pub use agents::{run, Agent, AgentRef, Outcome, RuntimeContext};
pub use config::{Config, ConfigError};
pub use scout::{Collaborators, ScoutError, TravelScout};
pub use task::{TaskSpec, Trip, UserProfile, Visit};
