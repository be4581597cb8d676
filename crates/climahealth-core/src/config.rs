use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the OpenWeatherMap API key.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

/// Default retention for the alert history.
pub const DEFAULT_ALERT_LIMIT: usize = 50;

/// Default retention for the symptom history.
pub const DEFAULT_SYMPTOM_LIMIT: usize = 100;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database and the weather cache
    pub data_dir: PathBuf,

    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Retention caps for the history stores
    #[serde(default)]
    pub history: HistoryConfig,

    /// Risk analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Which key-value backend holds profiles and history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// SQLite file name, relative to `data_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_database_file() -> String {
    "climahealth.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_file: default_database_file(),
        }
    }
}

/// Fallback coordinates when no location is supplied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // São Paulo
        Self {
            latitude: -23.5505,
            longitude: -46.6333,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key (optional, can be set via environment)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider base URL
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Upper bound on a single provider round-trip
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a cached snapshot may stand in for a failed fetch
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_minutes: u32,

    #[serde(default)]
    pub default_location: LocationConfig,
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_cache_max_age() -> u32 {
    30
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var(API_KEY_ENV).ok(),
            base_url: default_weather_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_max_age_minutes: default_cache_max_age(),
            default_location: LocationConfig::default(),
        }
    }
}

impl WeatherConfig {
    /// API key from the file, falling back to the environment
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_alert_limit")]
    pub alert_limit: usize,
    #[serde(default = "default_symptom_limit")]
    pub symptom_limit: usize,
}

fn default_alert_limit() -> usize {
    DEFAULT_ALERT_LIMIT
}

fn default_symptom_limit() -> usize {
    DEFAULT_SYMPTOM_LIMIT
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            alert_limit: DEFAULT_ALERT_LIMIT,
            symptom_limit: DEFAULT_SYMPTOM_LIMIT,
        }
    }
}

/// How profile conditions are compared against rule keywords
///
/// Defaults to `Normalized` rather than a strict case-sensitive comparison,
/// so `"ASMA"` fires the asthma rule. Set `"exact"` for byte-for-byte matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionMatching {
    /// Byte-for-byte comparison
    Exact,
    /// Trimmed, case- and accent-insensitive comparison
    #[default]
    Normalized,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub condition_matching: ConditionMatching,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("climahealth");

        Self {
            data_dir,
            storage: StorageConfig::default(),
            weather: WeatherConfig::default(),
            history: HistoryConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default configuration to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", config_path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Ok(Self::load()?.validated()?)
    }

    /// Validate, logging warnings and rejecting the config on any error
    pub fn validated(self) -> std::result::Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.resolved_api_key().is_none() {
            result.add_warning(
                "weather.api_key",
                format!(
                    "No API key configured (set {}) - risk analysis will be skipped",
                    API_KEY_ENV
                ),
            );
        }

        if self.weather.timeout_secs == 0 {
            result.add_warning(
                "weather.timeout_secs",
                "Provider timeout is 0 seconds - every fetch will time out",
            );
        } else if self.weather.timeout_secs > 120 {
            result.add_warning(
                "weather.timeout_secs",
                "Provider timeout is longer than 2 minutes",
            );
        }

        let loc = self.weather.default_location;
        if !(-90.0..=90.0).contains(&loc.latitude) {
            result.add_error(
                "weather.default_location.latitude",
                "Latitude must be between -90 and 90",
            );
        }
        if !(-180.0..=180.0).contains(&loc.longitude) {
            result.add_error(
                "weather.default_location.longitude",
                "Longitude must be between -180 and 180",
            );
        }

        if self.history.alert_limit == 0 {
            result.add_error("history.alert_limit", "Alert history must keep at least 1 entry");
        }
        if self.history.symptom_limit == 0 {
            result.add_error(
                "history.symptom_limit",
                "Symptom history must keep at least 1 entry",
            );
        }

        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.database_file.trim().is_empty()
        {
            result.add_error("storage.database_file", "Database file name cannot be empty");
        }
        if self.storage.backend == StorageBackend::Memory {
            result.add_warning(
                "storage.backend",
                "In-memory storage - profiles and history are lost on exit",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Full path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.database_file)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("climahealth");

        Ok(config_dir.join("config.toml"))
    }
}
