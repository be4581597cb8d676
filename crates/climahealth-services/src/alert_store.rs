//! Bounded log of past analyses.

use chrono::{DateTime, Utc};
use climahealth_core::config::DEFAULT_ALERT_LIMIT;
use climahealth_health::HealthRisk;
use climahealth_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::kv::{keys, load_json_list, save_json, SharedStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertHistoryEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub risks: Vec<HealthRisk>,
    pub recommendations: Vec<String>,
    /// Older records hold the raw provider payload here; it is normalized on load.
    #[serde(deserialize_with = "climahealth_weather::recorded::deserialize")]
    pub weather_data: WeatherSnapshot,
    #[serde(default)]
    pub acknowledged: bool,
}

/// Most recent first, capped at `limit` entries.
#[derive(Clone)]
pub struct AlertHistoryStore {
    kv: SharedStore,
    limit: usize,
}

impl AlertHistoryStore {
    pub fn new(kv: SharedStore) -> Self {
        Self::with_limit(kv, DEFAULT_ALERT_LIMIT)
    }

    pub fn with_limit(kv: SharedStore, limit: usize) -> Self {
        Self {
            kv,
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Capture an analysis result at the head of the log.
    ///
    /// Callers only record when at least one risk fired.
    pub fn record(
        &self,
        risks: Vec<HealthRisk>,
        recommendations: Vec<String>,
        snapshot: WeatherSnapshot,
    ) -> StoreResult<AlertHistoryEntry> {
        let entry = AlertHistoryEntry {
            id: Uuid::now_v7().to_string(),
            date: Utc::now(),
            risks,
            recommendations,
            weather_data: snapshot,
            acknowledged: false,
        };

        let mut entries = self.list()?;
        entries.insert(0, entry.clone());
        if entries.len() > self.limit {
            tracing::debug!("Alert history over {}, dropping {} oldest", self.limit, entries.len() - self.limit);
            entries.truncate(self.limit);
        }
        save_json(self.kv.as_ref(), keys::ALERT_HISTORY, &entries)?;

        tracing::debug!("Recorded alert {} with {} risks", entry.id, entry.risks.len());
        Ok(entry)
    }

    /// Mark an entry as seen. Returns false when the id is unknown or
    /// the entry was already acknowledged; nothing is written then.
    pub fn acknowledge(&self, id: &str) -> StoreResult<bool> {
        let mut entries = self.list()?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };
        if entry.acknowledged {
            return Ok(false);
        }
        entry.acknowledged = true;
        save_json(self.kv.as_ref(), keys::ALERT_HISTORY, &entries)?;
        tracing::debug!("Acknowledged alert {}", id);
        Ok(true)
    }

    pub fn list(&self) -> StoreResult<Vec<AlertHistoryEntry>> {
        load_json_list(self.kv.as_ref(), keys::ALERT_HISTORY)
    }

    pub fn unacknowledged(&self) -> StoreResult<Vec<AlertHistoryEntry>> {
        Ok(self.list()?.into_iter().filter(|e| !e.acknowledged).collect())
    }
}
