//! Destination normalization.
//!
//! Destinations arrive as free text ("Seoul", "Bali, Indonesia", "japan").
//! Collaborators are keyed by a city name and an ISO country code.

use serde::Serialize;

/// Lowercase alias → ISO 3166-1 alpha-2 code. Cities and countries both map.
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("south korea", "KR"),
    ("korea", "KR"),
    ("seoul", "KR"),
    ("busan", "KR"),
    ("japan", "JP"),
    ("tokyo", "JP"),
    ("kyoto", "JP"),
    ("osaka", "JP"),
    ("india", "IN"),
    ("delhi", "IN"),
    ("new delhi", "IN"),
    ("mumbai", "IN"),
    ("nigeria", "NG"),
    ("lagos", "NG"),
    ("abuja", "NG"),
    ("port harcourt", "NG"),
    ("france", "FR"),
    ("paris", "FR"),
    ("kenya", "KE"),
    ("nairobi", "KE"),
    ("brazil", "BR"),
    ("sao paulo", "BR"),
    ("são paulo", "BR"),
    ("rio de janeiro", "BR"),
    ("egypt", "EG"),
    ("cairo", "EG"),
    ("singapore", "SG"),
    ("indonesia", "ID"),
    ("bali", "ID"),
    ("jakarta", "ID"),
    ("germany", "DE"),
    ("berlin", "DE"),
    ("uk", "GB"),
    ("united kingdom", "GB"),
    ("london", "GB"),
    ("usa", "US"),
    ("united states", "US"),
    ("new york", "US"),
];

/// Country alias → the city its cost-of-living row is keyed by.
const COUNTRY_CITIES: &[(&str, &str)] = &[
    ("south korea", "seoul"),
    ("korea", "seoul"),
    ("japan", "tokyo"),
    ("india", "delhi"),
    ("nigeria", "lagos"),
    ("france", "paris"),
    ("kenya", "nairobi"),
    ("brazil", "sao paulo"),
    ("egypt", "cairo"),
    ("singapore", "singapore"),
];

fn lookup<'a>(table: &'a [(&str, &'a str)], key: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, value)| *value)
}

/// A destination split into the parts collaborators key on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// The destination exactly as the user wrote it (trimmed)
    pub query: String,
    pub city: String,
    pub country: Option<String>,
    pub country_code: Option<&'static str>,
}

impl Location {
    /// Parse a free-text destination. Returns `None` for blank input.
    ///
    /// `"Bali, Indonesia"` → city `Bali`, country `Indonesia`, code `ID`.
    pub fn parse(raw: &str) -> Option<Self> {
        let query = raw.trim();
        if query.is_empty() {
            return None;
        }

        let mut parts = query.splitn(2, ',').map(str::trim);
        let city = parts.next().unwrap_or(query).to_string();
        let country = parts.next().filter(|c| !c.is_empty()).map(str::to_string);

        let country_code = country
            .as_deref()
            .and_then(|c| lookup(COUNTRY_CODES, &c.to_lowercase()))
            .or_else(|| lookup(COUNTRY_CODES, &city.to_lowercase()));

        Some(Self {
            query: query.to_string(),
            city,
            country,
            country_code,
        })
    }

    /// Key into the cost-of-living table: lowercase city, with a bare
    /// country name mapped to its reference city.
    pub fn cost_key(&self) -> String {
        let city = self.city.to_lowercase();
        let city = if city == "são paulo" {
            "sao paulo".to_string()
        } else {
            city
        };
        match lookup(COUNTRY_CITIES, &city) {
            Some(mapped) => mapped.to_string(),
            None => city,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.query)
    }
}
