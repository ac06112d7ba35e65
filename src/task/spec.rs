//! Open task description handed to an agent's `run`.
//!
//! A `TaskSpec` has no fixed schema: each agent reads the fields it
//! declares and ignores the rest. Typed accessors return `None` for
//! missing or mistyped fields so callers fall back to their defaults.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field selecting which child of the dispatching node handles a subtask.
pub const AGENT_INDEX: &str = "agent_index";

/// An open mapping of named fields.
///
/// # Invariants
/// - When present, `agent_index` must address one of the dispatching
///   node's children. The dispatcher rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskSpec(Map<String, Value>);

impl TaskSpec {
    /// Create an empty task.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Route this subtask to the child at `index`.
    pub fn routed_to(self, index: usize) -> Self {
        self.with(AGENT_INDEX, index)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String field; empty strings count as absent.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Numeric field. Numeric strings such as `"1500"` are accepted.
    pub fn f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// ISO-8601 calendar date (`YYYY-MM-DD`). A datetime prefix is accepted.
    pub fn date(&self, key: &str) -> Option<NaiveDate> {
        let raw = self.str(key)?;
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    /// Deserialize a nested field into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Raw `agent_index` value, if any. Validation is the dispatcher's job.
    pub fn agent_index(&self) -> Option<&Value> {
        self.0.get(AGENT_INDEX)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Build a task from a JSON object. Non-objects are rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for TaskSpec {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
