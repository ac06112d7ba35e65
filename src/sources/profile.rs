//! Single-document traveller profile.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::store::{read_document, write_document};
use super::StoreError;
use crate::task::UserProfile;

pub const PROFILE_FILE: &str = "user_profile.json";

/// `user_profile.json` under the data directory. A missing file is the
/// default profile.
#[derive(Clone)]
pub struct ProfileStore {
    path: PathBuf,
    persist_lock: Arc<Mutex<()>>,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn open(data_dir: &Path) -> Self {
        Self::new(data_dir.join(PROFILE_FILE))
    }

    pub async fn load(&self) -> Result<UserProfile, StoreError> {
        Ok(read_document(&self.path).await?.unwrap_or_default())
    }

    pub async fn save(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let _guard = self.persist_lock.lock().await;
        write_document(&self.path, profile).await?;
        tracing::info!(interests = profile.interests.len(), "Saved user profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProfileStore::open(dir.path()).load().await.unwrap();
        assert_eq!(profile, UserProfile::default());
        assert!(profile.interests.is_empty());
    }

    #[tokio::test]
    async fn saved_profile_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::open(dir.path().join("nested").as_path());
        let profile = UserProfile {
            home_city: "Port Harcourt".into(),
            ..UserProfile::default()
        }
        .with_interests(["food", "nature"]);
        store.save(&profile).await.unwrap();
        assert_eq!(ProfileStore::open(dir.path().join("nested").as_path()).load().await.unwrap(), profile);
    }

    #[tokio::test]
    async fn corrupt_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(PROFILE_FILE), "[1, 2").await.unwrap();
        let err = ProfileStore::open(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
