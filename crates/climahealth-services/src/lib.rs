//! Persistence and orchestration for ClimaHealth.
//!
//! Profiles and both histories are JSON blobs behind a [`KeyValueStore`],
//! backed by SQLite in production and by memory in tests.

pub mod advisor;
pub mod alert_store;
pub mod error;
pub mod kv;
pub mod profile_store;
pub mod report;
pub mod sqlite_store;
pub mod symptom_store;

pub use advisor::{Advisor, AdvisorError, Advisory, SnapshotSource};
pub use alert_store::{AlertHistoryEntry, AlertHistoryStore};
pub use error::{weather_app_error, StoreError, StoreResult};
pub use kv::{keys, load_json, load_json_list, save_json, KeyValueStore, MemoryStore, SharedStore};
pub use profile_store::ProfileStore;
pub use report::{
    build_daily_reports, summarize_weeks, DailyReport, ReportPeriod, TemperatureRange,
    TrendReport, WeeklySummary,
};
pub use sqlite_store::SqliteKvStore;
pub use symptom_store::{validate_symptoms, Severity, SymptomEntry, SymptomHistoryStore};
