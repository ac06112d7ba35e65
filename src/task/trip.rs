//! Upcoming trip records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::TaskSpec;

fn default_style() -> String {
    "cultural".to_string()
}

/// A planned trip as stored in the trip document and fed to the digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Sequential identifier assigned by the trip store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Total budget in USD
    pub budget: f64,

    #[serde(default = "default_style")]
    pub travel_style: String,

    /// RFC 3339 when written here; naive ISO timestamps from older files
    /// are read as UTC.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Trip {
    pub fn new(
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
    ) -> Self {
        Self {
            id: None,
            destination: destination.into(),
            start_date,
            end_date,
            budget,
            travel_style: default_style(),
            created_at: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.travel_style = style.into();
        self
    }

    /// Inclusive number of days, never less than one.
    pub fn duration_days(&self) -> u32 {
        inclusive_days(self.start_date, self.end_date)
    }

    /// Whether the trip starts on or after `today`.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.start_date >= today
    }

    /// Flatten into the task fields the agents read.
    pub fn to_task(&self) -> TaskSpec {
        TaskSpec::new()
            .with("destination", self.destination.clone())
            .with("start_date", self.start_date.to_string())
            .with("end_date", self.end_date.to_string())
            .with("budget", self.budget)
            .with("travel_style", self.travel_style.clone())
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc())
        });
    match parsed {
        Ok(ts) => Ok(Some(ts)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable created_at '{}': {}", raw, e);
            Ok(None)
        }
    }
}

/// Inclusive day count between two dates, clamped to at least one.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days() + 1;
    u32::try_from(days.max(1)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn duration_is_inclusive() {
        let trip = Trip::new("Seoul", date("2025-01-01"), date("2025-01-10"), 1500.0);
        assert_eq!(trip.duration_days(), 10);
    }

    #[test]
    fn reversed_dates_clamp_to_one_day() {
        assert_eq!(inclusive_days(date("2025-01-10"), date("2025-01-01")), 1);
    }

    #[test]
    fn deserializes_with_default_style() {
        let trip: Trip = serde_json::from_str(
            r#"{"destination":"Bali, Indonesia","start_date":"2025-12-01","end_date":"2025-12-10","budget":3000}"#,
        )
        .unwrap();
        assert_eq!(trip.travel_style, "cultural");
        assert!(trip.id.is_none());
    }

    #[test]
    fn reads_naive_and_offset_timestamps() {
        let trips: Vec<Trip> = serde_json::from_str(
            r#"[
                {"destination":"Paris","start_date":"2025-12-01","end_date":"2025-12-05","budget":1500,
                 "id":"1","created_at":"2025-11-01T10:00:00.123456"},
                {"destination":"Lima","start_date":"2026-01-01","end_date":"2026-01-05","budget":900,
                 "id":"2","created_at":"2025-11-02T08:30:00+01:00"},
                {"destination":"Oslo","start_date":"2026-02-01","end_date":"2026-02-05","budget":2000,
                 "id":"3","created_at":"last tuesday"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            trips[0].created_at.unwrap().to_rfc3339(),
            "2025-11-01T10:00:00.123456+00:00"
        );
        assert_eq!(
            trips[1].created_at.unwrap().to_rfc3339(),
            "2025-11-02T07:30:00+00:00"
        );
        assert!(trips[2].created_at.is_none());
    }

    #[test]
    fn to_task_carries_agent_fields() {
        let trip = Trip::new("Tokyo", date("2025-04-01"), date("2025-04-07"), 2500.0)
            .with_style("food");
        let task = trip.to_task();
        assert_eq!(task.str("destination"), Some("Tokyo"));
        assert_eq!(task.date("end_date"), Some(date("2025-04-07")));
        assert_eq!(task.f64("budget"), Some(2500.0));
        assert_eq!(task.str("travel_style"), Some("food"));
    }
}
