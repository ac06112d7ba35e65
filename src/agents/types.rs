//! Core types for the agent system.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field every payload carries to declare what it is.
pub const MARKER_FIELD: &str = "kind";

/// Field a degraded payload uses to explain why it is a fallback.
pub const NOTE_FIELD: &str = "note";

/// Unique identifier for an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Create a new unique agent ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::str::FromStr for AgentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a node executes work itself or decomposes it for its children.
///
/// Fixed at construction; the runtime never infers it from an empty
/// decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Leaf,
    Composite,
}

impl AgentKind {
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite)
    }
}

/// Declared payload tag. Merge-all aggregation routes on this, never on
/// the payload's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Advisory,
    Weather,
    Events,
    Discovery,
    Budget,
    HistoryStats,
    HistoryPatterns,
    HistoryEntry,
    Intelligence,
    Recommendation,
    Aggregated,
    Digest,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advisory => "advisory",
            Self::Weather => "weather",
            Self::Events => "events",
            Self::Discovery => "discovery",
            Self::Budget => "budget",
            Self::HistoryStats => "history_stats",
            Self::HistoryPatterns => "history_patterns",
            Self::HistoryEntry => "history_entry",
            Self::Intelligence => "intelligence",
            Self::Recommendation => "recommendation",
            Self::Aggregated => "aggregated",
            Self::Digest => "digest",
        }
    }

    /// Read the marker declared by a payload, if any.
    pub fn of(data: &Value) -> Option<Self> {
        data.get(MARKER_FIELD)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payload type with a fixed marker.
pub trait Tagged: Serialize {
    const MARKER: Marker;

    /// Serialize and stamp the marker field.
    fn to_tagged_value(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert(MARKER_FIELD.to_string(), Value::from(Self::MARKER.as_str()));
        }
        Ok(value)
    }
}

/// Result of one `run`, `execute` or `aggregate` call.
///
/// # Invariants
/// - `success == false` implies `error.is_some()`
/// - `data` may be populated on failure; failing and having something to
///   contribute are independent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Outcome {
    /// Create a successful outcome.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: None,
        }
    }

    /// Create a failed outcome.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Attach data (also allowed on failures).
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Marker declared by the payload.
    pub fn marker(&self) -> Option<Marker> {
        self.data.as_ref().and_then(Marker::of)
    }

    /// Whether the payload is a fallback rather than a real collaborator response.
    pub fn is_degraded(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("degraded"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether the outcome has non-null data to contribute.
    pub fn has_data(&self) -> bool {
        self.data.as_ref().is_some_and(|d| !d.is_null())
    }
}

/// What a leaf produced, before it is flattened into an [`Outcome`].
///
/// Leaves return this instead of raising: a collaborator failure becomes
/// either `Degraded` (fallback payload of the same shape) or `Failed`,
/// depending on the leaf's fixed policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    Ok(Value),
    Degraded { data: Value, reason: String },
    Failed(String),
}

impl Execution {
    /// Successful tagged payload.
    pub fn ok<P: Tagged>(payload: &P) -> Self {
        match payload.to_tagged_value() {
            Ok(data) => Self::Ok(data),
            Err(e) => Self::Failed(format!("Failed to encode {} payload: {}", P::MARKER, e)),
        }
    }

    /// Fallback tagged payload annotated with why it is a fallback.
    pub fn degraded<P: Tagged>(payload: &P, reason: impl Into<String>) -> Self {
        match payload.to_tagged_value() {
            Ok(data) => Self::Degraded {
                data,
                reason: reason.into(),
            },
            Err(e) => Self::Failed(format!("Failed to encode {} payload: {}", P::MARKER, e)),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

impl From<Execution> for Outcome {
    fn from(execution: Execution) -> Self {
        match execution {
            Execution::Ok(data) => Outcome::success(data),
            Execution::Degraded { mut data, reason } => {
                if let Value::Object(map) = &mut data {
                    map.insert(NOTE_FIELD.to_string(), Value::from(reason.clone()));
                }
                Outcome::success(data)
                    .with_metadata("degraded", true)
                    .with_metadata("reason", reason)
            }
            Execution::Failed(reason) => Outcome::failure(reason),
        }
    }
}

/// Errors raised by the runtime itself. Leaves never produce these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentError {
    #[error("agent_index {index} is out of range for '{agent}' with {children} children")]
    InvalidRoute {
        agent: String,
        index: usize,
        children: usize,
    },

    #[error("agent_index must be a non-negative integer, got {value} (agent '{agent}')")]
    MalformedRoute { agent: String, value: String },

    #[error("subtask for '{agent}' aborted: {reason}")]
    Aborted { agent: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Sample {
        destination: String,
    }

    impl Tagged for Sample {
        const MARKER: Marker = Marker::Weather;
    }

    #[test]
    fn tagged_payload_carries_marker() {
        let value = Sample {
            destination: "Seoul".into(),
        }
        .to_tagged_value()
        .unwrap();
        assert_eq!(value[MARKER_FIELD], "weather");
        assert_eq!(Marker::of(&value), Some(Marker::Weather));
    }

    #[test]
    fn degraded_execution_is_success_with_note() {
        let sample = Sample {
            destination: "Seoul".into(),
        };
        let outcome: Outcome = Execution::degraded(&sample, "WEATHERAPI_KEY is not configured").into();

        assert!(outcome.success);
        assert!(outcome.is_degraded());
        let data = outcome.data.as_ref().unwrap();
        assert_eq!(data[NOTE_FIELD], "WEATHERAPI_KEY is not configured");
        assert_eq!(outcome.marker(), Some(Marker::Weather));
    }

    #[test]
    fn failed_execution_has_error_and_no_data() {
        let outcome: Outcome = Execution::failed("boom").into();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("boom"));
        assert!(!outcome.has_data());
    }

    #[test]
    fn unknown_marker_reads_as_none() {
        assert_eq!(Marker::of(&json!({"kind": "mystery"})), None);
        assert_eq!(Marker::of(&json!({"destination": "Lima"})), None);
    }

    #[test]
    fn outcome_serializes_without_empty_fields() {
        let text = serde_json::to_string(&Outcome::failure("nope")).unwrap();
        assert_eq!(text, r#"{"success":false,"error":"nope"}"#);
    }
}
