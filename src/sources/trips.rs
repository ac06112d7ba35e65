//! Planned-trip persistence.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use super::{DocumentStore, JsonDocumentStore, StoreError};
use crate::task::Trip;

pub const TRIPS_FILE: &str = "trips.json";

/// Trip document with sequential ids.
#[derive(Clone)]
pub struct TripStore {
    store: Arc<dyn DocumentStore<Trip>>,
    /// Serializes id assignment so two saves never share an id
    save_lock: Arc<Mutex<()>>,
}

impl TripStore {
    pub fn new(store: Arc<dyn DocumentStore<Trip>>) -> Self {
        Self {
            store,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    /// `trips.json` under `data_dir`.
    pub fn open(data_dir: &Path) -> Self {
        Self::new(Arc::new(JsonDocumentStore::<Trip>::new(
            data_dir.join(TRIPS_FILE),
        )))
    }

    /// Persist `trip`, assigning the next sequential id and `created_at`.
    pub async fn save_trip(&self, mut trip: Trip) -> Result<Trip, StoreError> {
        let _guard = self.save_lock.lock().await;
        let mut trips = self.store.load().await?;
        trip.id = Some((trips.len() + 1).to_string());
        trip.created_at = Some(Utc::now());
        trips.push(trip.clone());
        self.store.save_whole(&trips).await?;
        tracing::info!(id = ?trip.id, destination = %trip.destination, "Saved trip");
        Ok(trip)
    }

    pub async fn load(&self) -> Result<Vec<Trip>, StoreError> {
        self.store.load().await
    }

    /// Trips starting on or after `today`, in stored order.
    pub async fn upcoming(&self, today: NaiveDate) -> Result<Vec<Trip>, StoreError> {
        Ok(self
            .store
            .load()
            .await?
            .into_iter()
            .filter(|t| t.is_upcoming(today))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::InMemoryStore;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn in_memory() -> TripStore {
        TripStore::new(Arc::new(InMemoryStore::<Trip>::new()))
    }

    #[tokio::test]
    async fn ids_are_sequential() {
        let store = in_memory();
        let a = store
            .save_trip(Trip::new("Seoul", date("2025-01-01"), date("2025-01-10"), 1500.0))
            .await
            .unwrap();
        let b = store
            .save_trip(Trip::new("Lagos", date("2025-02-01"), date("2025-02-05"), 900.0))
            .await
            .unwrap();
        assert_eq!(a.id.as_deref(), Some("1"));
        assert_eq!(b.id.as_deref(), Some("2"));
        assert!(b.created_at.is_some());
    }

    #[tokio::test]
    async fn upcoming_includes_today_and_skips_past() {
        let store = in_memory();
        for (dest, start) in [("Paris", "2025-03-01"), ("Tokyo", "2025-03-10"), ("Delhi", "2025-04-01")] {
            store
                .save_trip(Trip::new(dest, date(start), date(start), 1000.0))
                .await
                .unwrap();
        }
        let upcoming = store.upcoming(date("2025-03-10")).await.unwrap();
        let names: Vec<_> = upcoming.iter().map(|t| t.destination.as_str()).collect();
        assert_eq!(names, ["Tokyo", "Delhi"]);
    }

    #[tokio::test]
    async fn file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        TripStore::open(dir.path())
            .save_trip(Trip::new("Nairobi", date("2030-06-01"), date("2030-06-07"), 1200.0))
            .await
            .unwrap();
        let reopened = TripStore::open(dir.path()).load().await.unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened[0].destination, "Nairobi");
    }

    #[tokio::test]
    async fn loads_trips_written_with_naive_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(
            dir.path().join(TRIPS_FILE),
            r#"[
  {
    "destination": "Paris, France",
    "start_date": "2030-11-10",
    "end_date": "2030-11-15",
    "budget": 1500.0,
    "travel_style": "cultural",
    "id": "1",
    "created_at": "2025-11-01T10:00:00.123456"
  }
]"#,
        )
        .await
        .unwrap();

        let store = TripStore::open(dir.path());
        let upcoming = store.upcoming(date("2030-01-01")).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert!(upcoming[0].created_at.is_some());

        let next = store
            .save_trip(Trip::new("Rome", date("2030-12-01"), date("2030-12-03"), 800.0))
            .await
            .unwrap();
        assert_eq!(next.id.as_deref(), Some("2"));
    }
}
