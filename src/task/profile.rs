//! Traveller profile.

use serde::{Deserialize, Serialize};

/// Who is travelling and what they care about.
///
/// Every field is optional in the stored document; interests feed
/// destination discovery across all trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub home_country: String,
    pub home_city: String,
    pub interests: Vec<String>,
    pub profession: String,
    pub passport_country: String,
}

impl UserProfile {
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_defaults() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"home_city":"Port Harcourt","interests":["Food","Culture"],"pets":2}"#)
                .unwrap();
        assert_eq!(profile.home_city, "Port Harcourt");
        assert_eq!(profile.interests, ["Food", "Culture"]);
        assert!(profile.passport_country.is_empty());
    }
}
