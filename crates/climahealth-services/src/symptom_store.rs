//! User-reported symptoms, optionally annotated with the weather at entry time.

use chrono::{DateTime, Utc};
use climahealth_core::config::DEFAULT_SYMPTOM_LIMIT;
use climahealth_health::{normalize_labels, ValidationError};
use climahealth_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::kv::{keys, load_json_list, save_json, SharedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub severity: Severity,
    /// Empty when none were given; always written.
    #[serde(default)]
    pub notes: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "climahealth_weather::recorded::option::deserialize"
    )]
    pub weather: Option<WeatherSnapshot>,
}

/// Trim and de-duplicate symptom labels, rejecting an empty result.
pub fn validate_symptoms<I, S>(symptoms: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let symptoms = normalize_labels(symptoms);
    if symptoms.is_empty() {
        return Err(ValidationError::NoSymptoms);
    }
    Ok(symptoms)
}

#[derive(Clone)]
pub struct SymptomHistoryStore {
    kv: SharedStore,
    limit: usize,
}

impl SymptomHistoryStore {
    pub fn new(kv: SharedStore) -> Self {
        Self::with_limit(kv, DEFAULT_SYMPTOM_LIMIT)
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

    /// # Errors
    /// `StoreError::Validation` when no symptom survives trimming; the store is not touched.
    pub fn record(
        &self,
        symptoms: Vec<String>,
        severity: Severity,
        notes: Option<String>,
        weather: Option<WeatherSnapshot>,
    ) -> StoreResult<SymptomEntry> {
        let symptoms = validate_symptoms(symptoms)?;

        let entry = SymptomEntry {
            id: Uuid::now_v7().to_string(),
            date: Utc::now(),
            symptoms,
            severity,
            notes: notes.map(|n| n.trim().to_string()).unwrap_or_default(),
            weather,
        };

        let mut entries = self.list()?;
        entries.insert(0, entry.clone());
        entries.truncate(self.limit);
        save_json(self.kv.as_ref(), keys::SYMPTOM_HISTORY, &entries)?;

        tracing::debug!(
            "Recorded symptom entry {} ({} symptoms, weather: {})",
            entry.id,
            entry.symptoms.len(),
            entry.weather.is_some()
        );
        Ok(entry)
    }

    /// Returns whether an entry was removed.
    pub fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut entries = self.list()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        save_json(self.kv.as_ref(), keys::SYMPTOM_HISTORY, &entries)?;
        tracing::debug!("Deleted symptom entry {}", id);
        Ok(true)
    }

    pub fn list(&self) -> StoreResult<Vec<SymptomEntry>> {
        load_json_list(self.kv.as_ref(), keys::SYMPTOM_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::error::StoreError;
    use crate::kv::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn create_test_store() -> (Arc<MemoryStore>, SymptomHistoryStore) {
        let kv = Arc::new(MemoryStore::new());
        let store = SymptomHistoryStore::new(kv.clone());
        (kv, store)
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_record_and_list() {
        let (_, store) = create_test_store();
        let weather = WeatherSnapshot::new(18.0, 85, 1.0, 1);

        let entry = store
            .record(
                labels(&["Dor nas articulações", " Fadiga ", "Fadiga"]),
                Severity::High,
                Some("  piorou à noite ".into()),
                Some(weather),
            )
            .unwrap();

        assert_eq!(entry.symptoms, labels(&["Dor nas articulações", "Fadiga"]));
        assert_eq!(entry.notes, "piorou à noite");

        let entries = store.list().unwrap();
        assert_eq!(entries, vec![entry]);
        assert_eq!(entries[0].weather, Some(weather));
    }

    #[test]
    fn test_empty_symptoms_rejected_before_write() {
        let (kv, store) = create_test_store();
        store.record(labels(&["Tosse"]), Severity::Low, None, None).unwrap();
        let before = kv.get(keys::SYMPTOM_HISTORY).unwrap();

        let err = store.record(labels(&[" ", ""]), Severity::Low, None, None).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::NoSymptoms)));

        let err = store.record(vec![], Severity::Low, None, None).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::NoSymptoms)));

        assert_eq!(kv.get(keys::SYMPTOM_HISTORY).unwrap(), before);
    }

    #[test]
    fn test_capped_at_one_hundred() {
        let (_, store) = create_test_store();
        for i in 0..105 {
            store
                .record(vec![format!("s{}", i)], Severity::Medium, None, None)
                .unwrap();
        }

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 100);
        assert_eq!(entries[0].symptoms, vec!["s104"]);
        assert_eq!(entries[99].symptoms, vec!["s5"]);
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let (_, store) = create_test_store();
        let keep = store.record(labels(&["Tosse"]), Severity::Low, None, None).unwrap();
        let gone = store.record(labels(&["Espirros"]), Severity::Low, None, None).unwrap();

        assert!(store.delete(&gone.id).unwrap());
        assert!(!store.delete(&gone.id).unwrap());

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, keep.id);
    }

    #[test]
    fn test_loads_records_without_weather_or_with_payload() {
        let (kv, store) = create_test_store();
        kv.set(
            keys::SYMPTOM_HISTORY,
            r#"[
                {"id": "2", "date": "2024-02-01T08:00:00Z", "symptoms": ["Tosse"],
                 "severity": "low", "notes": "",
                 "weather": {"weather": {"main": {"temp": 12.0, "humidity": 90}}}},
                {"id": "1", "date": "2024-01-31T08:00:00Z", "symptoms": ["Fadiga"],
                 "severity": "high", "weather": null}
            ]"#,
        )
        .unwrap();

        let entries = store.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].weather, Some(WeatherSnapshot::new(12.0, 90, 0.0, 1)));
        assert_eq!(entries[1].weather, None);
        assert_eq!(entries[1].severity, Severity::High);
    }

    #[test]
    fn test_missing_notes_written_as_empty_string() {
        let (kv, store) = create_test_store();
        store.record(labels(&["Tosse"]), Severity::Low, None, None).unwrap();
        store.record(labels(&["Fadiga"]), Severity::Low, Some("   ".into()), None).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&kv.get(keys::SYMPTOM_HISTORY).unwrap().unwrap()).unwrap();
        for entry in raw.as_array().unwrap() {
            assert_eq!(entry["notes"], "");
        }
    }
}
