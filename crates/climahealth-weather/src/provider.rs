//! OpenWeatherMap provider: current conditions, UV index and air pollution,
//! normalized into a [`WeatherSnapshot`].

use crate::types::{
    AirPollution, CurrentConditions, Location, ProviderPayload, UvReading, WeatherError,
    WeatherSnapshot,
};
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const PLACEHOLDER_API_KEY: &str = "demo_key_replace_with_real_key";

/// Anything that can produce a snapshot for a location.
pub trait SnapshotProvider: Send + Sync {
    fn fetch_snapshot(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<WeatherSnapshot, WeatherError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn api_key(&self) -> Result<&str, WeatherError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => Ok(key),
            _ => Err(WeatherError::MissingApiKey),
        }
    }

    /// Fetch the combined provider payload.
    ///
    /// Current conditions are required; UV and air pollution are best-effort
    /// and fall back to their defaults when the upstream call fails.
    pub async fn fetch_payload(&self, location: &Location) -> Result<ProviderPayload, WeatherError> {
        let api_key = self.api_key()?;
        let lat = location.latitude.to_string();
        let lon = location.longitude.to_string();

        let weather: CurrentConditions = self
            .get_json(
                "/data/2.5/weather",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("appid", api_key),
                    ("units", "metric"),
                    ("lang", "pt_br"),
                ],
            )
            .await?;

        let uv: Option<UvReading> = self
            .get_optional(
                "/data/2.5/uvi",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", api_key)],
            )
            .await;

        let air_pollution: Option<AirPollution> = self
            .get_optional(
                "/data/2.5/air_pollution",
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", api_key)],
            )
            .await;

        tracing::info!(
            "Fetched weather for {}, {} (uv: {}, air: {})",
            location.latitude,
            location.longitude,
            uv.is_some(),
            air_pollution.is_some()
        );

        Ok(ProviderPayload {
            weather,
            uv,
            air_pollution,
            timestamp: Some(Utc::now()),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("Weather request {} returned status {}", path, status);
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))
    }

    async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Option<T> {
        match self.get_json(path, query).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Optional weather request {} failed: {}", path, e);
                None
            }
        }
    }
}

impl SnapshotProvider for WeatherProvider {
    async fn fetch_snapshot(&self, location: &Location) -> Result<WeatherSnapshot, WeatherError> {
        let payload = self.fetch_payload(location).await?;
        Ok(payload.to_snapshot())
    }
}
