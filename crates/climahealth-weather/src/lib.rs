//! Weather snapshots for ClimaHealth
//!
//! Fetches current conditions, UV index and air pollution from OpenWeatherMap,
//! normalizes them into a [`WeatherSnapshot`] and keeps the last good reading
//! on disk.

pub mod cache;
pub mod provider;
pub mod types;

pub use cache::{CachedSnapshot, WeatherCache};
pub use provider::{SnapshotProvider, WeatherProvider, DEFAULT_BASE_URL};
pub use types::*;
