//! Store error types and their mapping into the application hierarchy.

use climahealth_core::{
    AppError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt, WeatherError,
};
use climahealth_health::ValidationError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before anything was written.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Persisted blob could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => AppError::Validation(e.to_string()),
            StoreError::Database(e) => AppError::Database(e.into_database_error()),
            StoreError::Serialization(e) => {
                AppError::Database(DatabaseError::Corruption(e.to_string()))
            }
            StoreError::NotFound(id) => AppError::Storage(format!("record not found: {}", id)),
        }
    }
}

/// Map a provider error into the application hierarchy.
pub fn weather_app_error(err: climahealth_weather::WeatherError) -> AppError {
    use climahealth_weather::WeatherError as Provider;

    match err {
        Provider::Network(e) => AppError::Network(e.into_network_error()),
        Provider::MissingApiKey => AppError::Weather(WeatherError::MissingApiKey),
        Provider::Upstream { status, message } if status >= 500 => {
            tracing::debug!("Upstream {} body: {}", status, message);
            AppError::Weather(WeatherError::ServiceUnavailable)
        }
        Provider::Upstream { status, message } => {
            AppError::Weather(WeatherError::ApiError(format!("{}: {}", status, message)))
        }
        Provider::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
        Provider::Cache(msg) => AppError::Weather(WeatherError::CacheError(msg)),
        Provider::Timeout(_) => AppError::Network(NetworkError::Timeout),
    }
}
