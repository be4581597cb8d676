//! Last-known snapshot, persisted as JSON so a failed fetch can fall back to it.

use crate::types::{Location, WeatherError, WeatherSnapshot};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CACHE_FILE: &str = "weather_cache.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    pub snapshot: WeatherSnapshot,
    pub location: Location,
    pub fetched_at: DateTime<Utc>,
}

impl CachedSnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }
}

#[derive(Debug)]
pub struct WeatherCache {
    cache_path: PathBuf,
    data: Option<CachedSnapshot>,
}

impl WeatherCache {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            cache_path: data_dir.join(CACHE_FILE),
            data: None,
        }
    }

    /// Open the cache and read whatever is on disk.
    ///
    /// An unreadable file is logged and treated as empty.
    pub fn open(data_dir: &Path) -> Self {
        let mut cache = Self::new(data_dir);
        let loaded = cache.load().map(|_| ());
        if let Err(e) = loaded {
            tracing::warn!("Ignoring weather cache at {}: {}", cache.cache_path.display(), e);
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    pub fn load(&mut self) -> Result<Option<&CachedSnapshot>, WeatherError> {
        if !self.cache_path.exists() {
            self.data = None;
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.cache_path)
            .map_err(|e| WeatherError::Cache(format!("read failed: {}", e)))?;
        let cached: CachedSnapshot = serde_json::from_str(&json)
            .map_err(|e| WeatherError::Cache(format!("corrupt cache: {}", e)))?;

        self.data = Some(cached);
        Ok(self.data.as_ref())
    }

    pub fn store(
        &mut self,
        snapshot: WeatherSnapshot,
        location: &Location,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), WeatherError> {
        let cached = CachedSnapshot {
            snapshot,
            location: location.clone(),
            fetched_at,
        };

        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WeatherError::Cache(format!("create dir failed: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(&cached)
            .map_err(|e| WeatherError::Cache(format!("serialize failed: {}", e)))?;
        std::fs::write(&self.cache_path, json)
            .map_err(|e| WeatherError::Cache(format!("write failed: {}", e)))?;

        tracing::debug!("Cached snapshot at {}", self.cache_path.display());
        self.data = Some(cached);
        Ok(())
    }

    pub fn latest(&self) -> Option<&CachedSnapshot> {
        self.data.as_ref()
    }

    /// The cached snapshot if it is no older than `max_age`.
    pub fn fresh(&self, max_age: Duration, now: DateTime<Utc>) -> Option<&CachedSnapshot> {
        self.data.as_ref().filter(|c| c.age(now) <= max_age)
    }
}
