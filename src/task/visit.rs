//! Past visits recorded in the travel history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One visited location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    /// 1 to 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Visit {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: Some(country.into()),
            visit_date: None,
            duration_days: None,
            rating: None,
            notes: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.visit_date = Some(date);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_records_deserialize() {
        let visit: Visit = serde_json::from_str(r#"{"name": "Kyoto"}"#).unwrap();
        assert_eq!(visit.name, "Kyoto");
        assert!(visit.country.is_none());
        assert_eq!(
            serde_json::to_string(&visit).unwrap(),
            r#"{"name":"Kyoto"}"#
        );
    }
}
