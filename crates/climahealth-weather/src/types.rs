use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Humidity used when the provider omits it.
pub const DEFAULT_HUMIDITY: u8 = 1;

/// Air-quality category used when the provider omits it (1 = good).
pub const DEFAULT_AIR_QUALITY_INDEX: u8 = 1;

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            city_name: None,
        }
    }
}

/// A single point-in-time weather/UV/air-quality reading.
///
/// Field names match the persisted JSON records (`uvIndex`, `airQualityIndex`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity, 0-100
    pub humidity: u8,
    /// UV index, no hard upper bound
    pub uv_index: f64,
    /// Air-quality category, 1 (good) through 5 (very poor)
    pub air_quality_index: u8,
}

impl WeatherSnapshot {
    pub fn new(temperature: f64, humidity: u8, uv_index: f64, air_quality_index: u8) -> Self {
        Self {
            temperature,
            humidity,
            uv_index,
            air_quality_index,
        }
    }

    /// True when every field holds a usable reading.
    pub fn is_well_formed(&self) -> bool {
        self.temperature.is_finite()
            && self.uv_index.is_finite()
            && self.uv_index >= 0.0
            && self.humidity <= 100
            && (1..=5).contains(&self.air_quality_index)
    }

    pub fn air_quality(&self) -> Option<AirQuality> {
        AirQuality::from_index(self.air_quality_index)
    }

    pub fn uv_level(&self) -> UvLevel {
        UvLevel::from_index(self.uv_index)
    }

    /// Accept either a snapshot or a raw provider payload.
    ///
    /// History written by older versions embedded the whole provider response.
    pub fn from_recorded(value: serde_json::Value) -> Option<Self> {
        if let Ok(snapshot) = serde_json::from_value::<WeatherSnapshot>(value.clone()) {
            return Some(snapshot);
        }
        serde_json::from_value::<ProviderPayload>(value)
            .ok()
            .map(|payload| payload.to_snapshot())
    }
}

/// Air-quality categories as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirQuality {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AirQuality {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Self::Good),
            2 => Some(Self::Fair),
            3 => Some(Self::Moderate),
            4 => Some(Self::Poor),
            5 => Some(Self::VeryPoor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Boa",
            Self::Fair => "Razoável",
            Self::Moderate => "Moderada",
            Self::Poor => "Ruim",
            Self::VeryPoor => "Muito Ruim",
        }
    }
}

/// UV exposure bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    pub fn from_index(uv: f64) -> Self {
        if uv <= 2.0 {
            Self::Low
        } else if uv <= 5.0 {
            Self::Moderate
        } else if uv <= 7.0 {
            Self::High
        } else if uv <= 10.0 {
            Self::VeryHigh
        } else {
            Self::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Baixo",
            Self::Moderate => "Moderado",
            Self::High => "Alto",
            Self::VeryHigh => "Muito Alto",
            Self::Extreme => "Extremo",
        }
    }
}

/// Combined provider response: current conditions plus UV and air pollution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayload {
    pub weather: CurrentConditions,
    #[serde(default)]
    pub uv: Option<UvReading>,
    #[serde(default)]
    pub air_pollution: Option<AirPollution>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ProviderPayload {
    /// Normalize to a snapshot, filling documented defaults for missing readings.
    pub fn to_snapshot(&self) -> WeatherSnapshot {
        let humidity = self
            .weather
            .main
            .humidity
            .filter(|h| h.is_finite())
            .map(|h| h.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(DEFAULT_HUMIDITY);

        let uv_index = self
            .uv
            .as_ref()
            .map(|uv| uv.value)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);

        let air_quality_index = self
            .air_pollution
            .as_ref()
            .and_then(|air| air.list.first())
            .map(|entry| entry.main.aqi)
            .filter(|aqi| *aqi > 0)
            .unwrap_or(DEFAULT_AIR_QUALITY_INDEX);

        WeatherSnapshot {
            temperature: self.weather.main.temp,
            humidity,
            uv_index,
            air_quality_index,
        }
    }
}

/// `/data/2.5/weather` response (the fields we read)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<ConditionDescription>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDescription {
    pub main: String,
    pub description: String,
}

/// `/data/2.5/uvi` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UvReading {
    pub value: f64,
}

/// `/data/2.5/air_pollution` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirPollution {
    #[serde(default)]
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirPollutionEntry {
    pub main: AqiReading,
    #[serde(default)]
    pub components: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AqiReading {
    pub aqi: u8,
}

/// Serde adapters for weather embedded in history records.
pub mod recorded {
    use super::WeatherSnapshot;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<WeatherSnapshot, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        WeatherSnapshot::from_recorded(value)
            .ok_or_else(|| D::Error::custom("unrecognized weather record"))
    }

    /// Optional variant: anything unrecognizable becomes `None`.
    pub mod option {
        use super::WeatherSnapshot;
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<WeatherSnapshot>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let value = Option::<serde_json::Value>::deserialize(deserializer)?;
            Ok(value.and_then(WeatherSnapshot::from_recorded))
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Provider did not answer within {0} seconds")]
    Timeout(u64),
}
