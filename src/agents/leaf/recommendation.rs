//! Recommendation generator - the AI-written digest text.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::agents::{Agent, AgentId, AgentKind, Execution, Marker, Outcome, RuntimeContext, Tagged};
use crate::sources::{TextGenerator, DEFAULT_SYSTEM_PROMPT};
use crate::task::TaskSpec;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub recommendations: String,
    pub generated_at: DateTime<Utc>,
    /// Top-level context keys the text was generated from
    pub context_used: Vec<String>,
}

impl Tagged for Recommendation {
    const MARKER: Marker = Marker::Recommendation;
}

fn build_prompt(context: &str) -> String {
    format!(
        "As an AI Travel Scout, generate personalized travel recommendations.\n\n\
         Context:\n{}\n\n\
         Generate a friendly weekly travel digest that includes:\n\
         1. 2-3 destination recommendations based on travel history\n\
         2. Planning tips for upcoming trips with specific weather details\n\
         3. Budget insights\n\
         4. Unique experiences to consider\n\n\
         Keep it concise and actionable.",
        context
    )
}

/// Every `destination` string found in the context, first occurrence first.
fn destinations(context: &Value) -> Vec<String> {
    fn walk(value: &Value, found: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(dest)) = map.get("destination") {
                    if !found.contains(dest) {
                        found.push(dest.clone());
                    }
                }
                map.values().for_each(|v| walk(v, found));
            }
            Value::Array(items) => items.iter().for_each(|v| walk(v, found)),
            _ => {}
        }
    }

    let mut found = Vec::new();
    walk(context, &mut found);
    found
}

/// Text used when the generator is unavailable.
fn canned(context: &Value) -> String {
    let places = destinations(context);
    let heading = if places.is_empty() {
        "your destination".to_string()
    } else {
        places.join(", ")
    };
    format!(
        "Travel Recommendation for {}\n\n\
         Based on your preferences and current conditions:\n\n\
         Top Picks:\n\
         1. Visit during optimal weather conditions\n\
         2. Explore local cultural sites matching your interests\n\
         3. Try authentic local cuisine\n\n\
         Budget Tip: Book accommodations 2-3 months in advance\n\n\
         Safety: Check the advisory level for each destination before you go",
        heading
    )
}

/// Reads the `context` object built by the digest.
pub struct RecommendationGenerator {
    id: AgentId,
    generator: Arc<dyn TextGenerator>,
}

impl RecommendationGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            id: AgentId::new(),
            generator,
        }
    }

    pub async fn generate(&self, task: &TaskSpec) -> Execution {
        let context = match task.get("context") {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        };
        let context_used = context
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let rendered = match serde_json::to_string_pretty(&context) {
            Ok(rendered) => rendered,
            Err(e) => return Execution::failed(format!("Failed to encode context: {}", e)),
        };

        match self
            .generator
            .generate(&build_prompt(&rendered), DEFAULT_SYSTEM_PROMPT)
            .await
        {
            Ok(text) => Execution::ok(&Recommendation {
                recommendations: text,
                generated_at: Utc::now(),
                context_used,
            }),
            Err(e) => {
                tracing::warn!("Recommendation text unavailable: {}", e);
                Execution::degraded(
                    &Recommendation {
                        recommendations: canned(&context),
                        generated_at: Utc::now(),
                        context_used,
                    },
                    e.to_string(),
                )
            }
        }
    }
}

#[async_trait]
impl Agent for RecommendationGenerator {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "RecommendationGenerator"
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Leaf
    }

    fn capabilities(&self) -> &[&'static str] {
        &["ai_generation", "personalization"]
    }

    async fn execute(&self, task: &TaskSpec, _ctx: &RuntimeContext) -> Outcome {
        self.generate(task).await.into()
    }

    fn description(&self) -> &str {
        "Writes the personalized weekly digest text"
    }
}
