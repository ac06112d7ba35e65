//! Aggregation policies for composite agents.
//!
//! - [`SuccessesOnly`]: drop failed subtasks, fail if nothing succeeded
//! - [`MergeAll`]: fold every subtask's data into marker-keyed buckets,
//!   regardless of success, so one failing branch degrades instead of vanishing

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use super::{Marker, Outcome, MARKER_FIELD};

/// Folds positionally aligned child outcomes into one outcome.
pub trait AggregationPolicy: Send + Sync {
    fn aggregate(&self, results: Vec<Outcome>) -> Outcome;
}

/// Default policy: keep successful payloads only.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessesOnly;

impl AggregationPolicy for SuccessesOnly {
    fn aggregate(&self, results: Vec<Outcome>) -> Outcome {
        let total = results.len();
        let successful: Vec<Value> = results
            .into_iter()
            .filter(|r| r.success)
            .map(|r| r.data.unwrap_or(Value::Null))
            .collect();

        if successful.is_empty() {
            return Outcome::failure(format!("All subtasks failed ({} attempted)", total))
                .with_metadata("total_subtasks", total)
                .with_metadata("successful_subtasks", 0);
        }

        let count = successful.len();
        Outcome::success(json!({
            "kind": Marker::Aggregated,
            "aggregated_results": successful,
            "total_subtasks": total,
            "successful_subtasks": count,
        }))
    }
}

/// Where a marker's payload lands in the merged structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `merged[name] = data`
    Slot(&'static str),
    /// `merged[bucket][key] = data`
    Nested(&'static str, &'static str),
    /// `merged[name].push(data)`
    List(&'static str),
}

/// Bucket receiving payloads whose marker has no placement.
pub const UNCLASSIFIED: &str = "unclassified";

/// Merge every non-null payload into a bucket chosen by its marker.
///
/// # Postconditions
/// - `success == true` iff at least one subtask contributed non-null data
/// - `scans_completed` counts subtasks whose own `success` was true
/// - List buckets keep submission order
#[derive(Debug, Clone)]
pub struct MergeAll {
    result_marker: Marker,
    placements: HashMap<Marker, Placement>,
    /// Declaration order, used to lay out the empty skeleton
    order: Vec<Placement>,
}

impl MergeAll {
    /// Policy whose merged payload is tagged `result_marker`.
    pub fn new(result_marker: Marker) -> Self {
        Self {
            result_marker,
            placements: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn slot(self, marker: Marker, name: &'static str) -> Self {
        self.place(marker, Placement::Slot(name))
    }

    pub fn nested(self, marker: Marker, bucket: &'static str, key: &'static str) -> Self {
        self.place(marker, Placement::Nested(bucket, key))
    }

    pub fn list(self, marker: Marker, name: &'static str) -> Self {
        self.place(marker, Placement::List(name))
    }

    fn place(mut self, marker: Marker, placement: Placement) -> Self {
        debug_assert!(
            !self.placements.contains_key(&marker),
            "marker {} placed twice",
            marker
        );
        self.placements.insert(marker, placement);
        self.order.push(placement);
        self
    }

    pub fn placement(&self, marker: Marker) -> Option<Placement> {
        self.placements.get(&marker).copied()
    }

    /// Empty buckets so consumers always see the same shape.
    fn skeleton(&self) -> Map<String, Value> {
        let mut merged = Map::new();
        for placement in &self.order {
            match *placement {
                Placement::Slot(_) => {}
                Placement::Nested(bucket, _) => {
                    merged
                        .entry(bucket)
                        .or_insert_with(|| Value::Object(Map::new()));
                }
                Placement::List(name) => {
                    merged
                        .entry(name)
                        .or_insert_with(|| Value::Array(Vec::new()));
                }
            }
        }
        merged
    }

    fn insert(merged: &mut Map<String, Value>, placement: Placement, data: Value) {
        match placement {
            Placement::Slot(name) => {
                if merged.insert(name.to_string(), data).is_some() {
                    tracing::warn!(slot = name, "Slot filled twice; keeping the later payload");
                }
            }
            Placement::Nested(bucket, key) => {
                let entry = merged
                    .entry(bucket)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(inner) = entry {
                    if inner.insert(key.to_string(), data).is_some() {
                        tracing::warn!(bucket, key, "Slot filled twice; keeping the later payload");
                    }
                }
            }
            Placement::List(name) => push(merged, name, data),
        }
    }
}

fn push(merged: &mut Map<String, Value>, name: &str, data: Value) {
    let entry = merged
        .entry(name)
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        items.push(data);
    }
}

impl AggregationPolicy for MergeAll {
    fn aggregate(&self, results: Vec<Outcome>) -> Outcome {
        let total = results.len();
        let mut scans_completed = 0usize;
        let mut contributed = 0usize;
        let mut merged = self.skeleton();

        for result in results {
            if result.success {
                scans_completed += 1;
            }
            let data = match result.data {
                Some(data) if !data.is_null() => data,
                _ => continue,
            };
            contributed += 1;

            match Marker::of(&data).and_then(|m| self.placement(m)) {
                Some(placement) => Self::insert(&mut merged, placement, data),
                None => {
                    tracing::warn!(
                        marker = ?data.get(MARKER_FIELD),
                        "Payload has no placement; keeping it under '{}'",
                        UNCLASSIFIED
                    );
                    push(&mut merged, UNCLASSIFIED, data);
                }
            }
        }

        if contributed == 0 {
            return Outcome::failure(format!("No subtask produced data ({} attempted)", total))
                .with_metadata("total_subtasks", total)
                .with_metadata("scans_completed", scans_completed);
        }

        merged.insert(MARKER_FIELD.to_string(), json!(self.result_marker));
        merged.insert("scans_completed".to_string(), json!(scans_completed));
        merged.insert("total_subtasks".to_string(), json!(total));
        Outcome::success(Value::Object(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: &str, n: u32) -> Value {
        json!({"kind": kind, "n": n})
    }

    #[test]
    fn successes_only_fails_when_nothing_succeeds() {
        let outcome = SuccessesOnly.aggregate(vec![
            Outcome::failure("a"),
            Outcome::failure("b").with_data(payload("weather", 1)),
        ]);
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("2 attempted"));
    }

    #[test]
    fn successes_only_counts_and_drops_failures() {
        let outcome = SuccessesOnly.aggregate(vec![
            Outcome::success(payload("weather", 1)),
            Outcome::failure("down"),
            Outcome::success(payload("events", 3)),
        ]);
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["total_subtasks"], 3);
        assert_eq!(data["successful_subtasks"], 2);
        assert_eq!(data["aggregated_results"][1]["n"], 3);
        assert_eq!(data["kind"], "aggregated");
    }

    #[test]
    fn successes_only_on_empty_input_fails() {
        assert!(!SuccessesOnly.aggregate(Vec::new()).success);
    }

    fn digest_policy() -> MergeAll {
        MergeAll::new(Marker::Digest)
            .nested(Marker::HistoryStats, "history", "stats")
            .nested(Marker::HistoryPatterns, "history", "patterns")
            .list(Marker::Intelligence, "intelligence")
            .list(Marker::Budget, "budget")
    }

    #[test]
    fn merge_all_routes_by_marker() {
        let outcome = digest_policy().aggregate(vec![
            Outcome::success(payload("history_stats", 1)),
            Outcome::success(payload("history_patterns", 2)),
            Outcome::success(payload("intelligence", 3)),
            Outcome::success(payload("budget", 4)),
            Outcome::success(payload("intelligence", 5)),
        ]);
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["history"]["stats"]["n"], 1);
        assert_eq!(data["history"]["patterns"]["n"], 2);
        assert_eq!(data["intelligence"][0]["n"], 3);
        assert_eq!(data["intelligence"][1]["n"], 5);
        assert_eq!(data["budget"][0]["n"], 4);
        assert_eq!(data["scans_completed"], 5);
        assert_eq!(data["kind"], "digest");
    }

    #[test]
    fn merge_all_succeeds_when_every_subtask_failed_with_data() {
        let outcome = digest_policy().aggregate(vec![
            Outcome::failure("x").with_data(payload("budget", 1)),
            Outcome::failure("y"),
        ]);
        assert!(outcome.success);
        let data = outcome.data.unwrap();
        assert_eq!(data["scans_completed"], 0);
        assert_eq!(data["total_subtasks"], 2);
        assert_eq!(data["budget"][0]["n"], 1);
    }

    #[test]
    fn merge_all_without_data_fails() {
        let outcome = digest_policy().aggregate(vec![
            Outcome::failure("x"),
            Outcome::failure("y").with_data(Value::Null),
        ]);
        assert!(!outcome.success);
    }

    #[test]
    fn merge_all_keeps_empty_buckets() {
        let outcome = digest_policy().aggregate(vec![Outcome::success(payload("budget", 1))]);
        let data = outcome.data.unwrap();
        assert_eq!(data["intelligence"], json!([]));
        assert_eq!(data["history"], json!({}));
    }

    #[test]
    fn merge_all_keeps_unclassified_payloads() {
        let outcome = digest_policy().aggregate(vec![Outcome::success(json!({"n": 9}))]);
        let data = outcome.data.unwrap();
        assert_eq!(data[UNCLASSIFIED][0]["n"], 9);
    }

    #[test]
    fn merge_all_slots() {
        let policy = MergeAll::new(Marker::Intelligence)
            .slot(Marker::Advisory, "advisory")
            .slot(Marker::Weather, "weather");
        let outcome = policy.aggregate(vec![
            Outcome::success(payload("advisory", 1)),
            Outcome::failure("down").with_data(payload("weather", 2)),
        ]);
        let data = outcome.data.unwrap();
        assert_eq!(data["advisory"]["n"], 1);
        assert_eq!(data["weather"]["n"], 2);
        assert_eq!(data["scans_completed"], 1);
        assert_eq!(data["kind"], "intelligence");
    }
}
