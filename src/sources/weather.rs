//! Weather forecasts from weatherapi.com.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{fetch_text, http_client, Location, RetryPolicy, SourceError, WeatherSource};

pub const WEATHERAPI_URL: &str = "http://api.weatherapi.com/v1";

/// Condition reported when no forecast could be fetched.
pub const UNAVAILABLE_CONDITION: &str = "Unavailable";

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub condition: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    /// Percent
    pub rain_chance: f64,
    pub rain_mm: f64,
    pub avg_humidity: f64,
}

/// Current conditions plus a multi-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub destination: String,
    pub current_temp_c: f64,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_kph: Option<f64>,
    #[serde(default)]
    pub daily: Vec<DailyForecast>,
    pub summary: String,
}

impl Forecast {
    /// Placeholder with the same shape as a real forecast. Deterministic.
    pub fn fallback(destination: &str) -> Self {
        Self {
            destination: destination.to_string(),
            current_temp_c: 22.0,
            condition: UNAVAILABLE_CONDITION.to_string(),
            feels_like_c: None,
            humidity: None,
            wind_kph: None,
            daily: Vec::new(),
            summary: format!("Weather data unavailable for {}", destination),
        }
    }

    /// "Currently 3°C (Sunny) | 2025-01-01: Snow, 1°C/-4°C | ..." over the
    /// first three days.
    fn summarize(&self) -> String {
        let mut parts = vec![format!(
            "Currently {}°C ({})",
            self.current_temp_c, self.condition
        )];
        for day in self.daily.iter().take(3) {
            parts.push(format!(
                "{}: {}, {}°C/{}°C",
                day.date, day.condition, day.max_temp_c, day.min_temp_c
            ));
        }
        parts.join(" | ")
    }
}

/// weatherapi.com client.
pub struct WeatherApiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl WeatherApiClient {
    pub fn new(api_key: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client: http_client(),
            api_key: api_key.into(),
            base_url: WEATHERAPI_URL.to_string(),
            retry,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, location: &Location, days: u32) -> Result<Forecast, SourceError> {
        let days = days.to_string();
        let request = self
            .client
            .get(format!("{}/forecast.json", self.base_url))
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location.query.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
            ]);
        parse_forecast(&fetch_text(request).await?)
    }
}

#[async_trait]
impl WeatherSource for WeatherApiClient {
    async fn forecast(&self, location: &Location, days: u32) -> Result<Forecast, SourceError> {
        if self.api_key.trim().is_empty() {
            return Err(SourceError::MissingCredential("WEATHERAPI_KEY"));
        }
        self.retry
            .run("weatherapi", move || self.fetch(location, days))
            .await
    }
}

/// Always unavailable; the weather leaf falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineWeather;

#[async_trait]
impl WeatherSource for OfflineWeather {
    async fn forecast(&self, _location: &Location, _days: u32) -> Result<Forecast, SourceError> {
        Err(SourceError::Offline("weather forecasts"))
    }
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: Option<f64>,
    humidity: Option<f64>,
    wind_kph: Option<f64>,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    #[serde(default)]
    daily_chance_of_rain: f64,
    #[serde(default)]
    totalprecip_mm: f64,
    #[serde(default)]
    avghumidity: f64,
    condition: WaCondition,
}

fn parse_forecast(body: &str) -> Result<Forecast, SourceError> {
    let response: WaResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let daily = response
        .forecast
        .forecastday
        .into_iter()
        .map(|d| DailyForecast {
            date: d.date,
            condition: d.day.condition.text,
            max_temp_c: d.day.maxtemp_c,
            min_temp_c: d.day.mintemp_c,
            rain_chance: d.day.daily_chance_of_rain,
            rain_mm: d.day.totalprecip_mm,
            avg_humidity: d.day.avghumidity,
        })
        .collect();

    let mut forecast = Forecast {
        destination: format!("{}, {}", response.location.name, response.location.country),
        current_temp_c: response.current.temp_c,
        condition: response.current.condition.text,
        feels_like_c: response.current.feelslike_c,
        humidity: response.current.humidity,
        wind_kph: response.current.wind_kph,
        daily,
        summary: String::new(),
    };
    forecast.summary = forecast.summarize();
    Ok(forecast)
}
