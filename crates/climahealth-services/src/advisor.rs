//! One advisory cycle: profile, snapshot, analysis, then history.
//!
//! Provider failures never surface as errors here. The cycle degrades to a
//! cached snapshot, or to an empty analysis when nothing usable exists.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use climahealth_core::{AppError, Config};
use climahealth_health::{Analysis, ConditionMatching, RiskAnalyzer};
use climahealth_weather::{Location, SnapshotProvider, WeatherCache, WeatherError, WeatherSnapshot};
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::alert_store::{AlertHistoryEntry, AlertHistoryStore};
use crate::error::{weather_app_error, StoreError};
use crate::kv::SharedStore;
use crate::profile_store::ProfileStore;
use crate::report::{ReportPeriod, TrendReport};
use crate::symptom_store::{validate_symptoms, Severity, SymptomEntry, SymptomHistoryStore};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CACHE_MAX_AGE_MINUTES: i64 = 30;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("No primary profile has been created")]
    NoProfile,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::NoProfile => {
                AppError::Validation("no primary profile has been created".to_string())
            }
            AdvisorError::Store(e) => e.into(),
        }
    }
}

/// Where the snapshot behind an advisory came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    Live,
    Cached,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub profile_id: String,
    pub snapshot: Option<WeatherSnapshot>,
    pub source: SnapshotSource,
    pub analysis: Analysis,
    /// Set when the analysis was written to the alert history
    pub alert: Option<AlertHistoryEntry>,
    /// User-facing reason the live provider could not be used
    pub notice: Option<&'static str>,
}

struct Fetched {
    snapshot: Option<WeatherSnapshot>,
    source: SnapshotSource,
    notice: Option<&'static str>,
}

pub struct Advisor<P> {
    provider: P,
    profiles: ProfileStore,
    alerts: AlertHistoryStore,
    symptoms: SymptomHistoryStore,
    analyzer: RiskAnalyzer,
    cache: Option<Mutex<WeatherCache>>,
    timeout: Duration,
    cache_max_age: chrono::Duration,
}

impl<P: SnapshotProvider> Advisor<P> {
    pub fn new(provider: P, kv: SharedStore) -> Self {
        Self {
            provider,
            profiles: ProfileStore::new(kv.clone()),
            alerts: AlertHistoryStore::new(kv.clone()),
            symptoms: SymptomHistoryStore::new(kv),
            analyzer: RiskAnalyzer::default(),
            cache: None,
            timeout: DEFAULT_TIMEOUT,
            cache_max_age: chrono::Duration::minutes(DEFAULT_CACHE_MAX_AGE_MINUTES),
        }
    }

    /// Build with retention caps, matching mode and timeouts from `config`.
    pub fn from_config(provider: P, kv: SharedStore, config: &Config) -> Self {
        let matching = match config.analysis.condition_matching {
            climahealth_core::ConditionMatching::Exact => ConditionMatching::Exact,
            climahealth_core::ConditionMatching::Normalized => ConditionMatching::Normalized,
        };

        Self {
            provider,
            profiles: ProfileStore::new(kv.clone()),
            alerts: AlertHistoryStore::with_limit(kv.clone(), config.history.alert_limit),
            symptoms: SymptomHistoryStore::with_limit(kv, config.history.symptom_limit),
            analyzer: RiskAnalyzer::new(matching),
            cache: None,
            timeout: Duration::from_secs(config.weather.timeout_secs.max(1)),
            cache_max_age: chrono::Duration::minutes(i64::from(config.weather.cache_max_age_minutes)),
        }
    }

    pub fn with_cache(mut self, cache: WeatherCache) -> Self {
        self.cache = Some(Mutex::new(cache));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn alerts(&self) -> &AlertHistoryStore {
        &self.alerts
    }

    pub fn symptoms(&self) -> &SymptomHistoryStore {
        &self.symptoms
    }

    pub fn analyzer(&self) -> &RiskAnalyzer {
        &self.analyzer
    }

    /// Fetch a snapshot under the configured timeout.
    ///
    /// On failure, a cached snapshot no older than the configured age is used.
    pub async fn current_snapshot(&self, location: &Location) -> (Option<WeatherSnapshot>, SnapshotSource) {
        let fetched = self.fetch(location).await;
        (fetched.snapshot, fetched.source)
    }

    async fn fetch(&self, location: &Location) -> Fetched {
        let result = tokio::time::timeout(self.timeout, self.provider.fetch_snapshot(location))
            .await
            .unwrap_or_else(|_| Err(WeatherError::Timeout(self.timeout.as_secs())));

        match result {
            Ok(snapshot) => {
                tracing::info!(
                    "Fetched snapshot for {:.4},{:.4}: {:.1}°C",
                    location.latitude,
                    location.longitude,
                    snapshot.temperature
                );
                if let Some(cache) = &self.cache {
                    let stored = cache.lock().store(snapshot, location, Utc::now());
                    if let Err(e) = stored {
                        tracing::warn!("Failed to cache snapshot: {}", e);
                    }
                }
                Fetched {
                    snapshot: Some(snapshot),
                    source: SnapshotSource::Live,
                    notice: None,
                }
            }
            Err(e) => {
                let err = weather_app_error(e);
                tracing::warn!("Weather provider unavailable: {}", err);
                let cached = self.cached_snapshot();
                if cached.is_some() {
                    tracing::info!("Using cached snapshot");
                }
                Fetched {
                    snapshot: cached,
                    source: if cached.is_some() {
                        SnapshotSource::Cached
                    } else {
                        SnapshotSource::Unavailable
                    },
                    notice: Some(err.user_message()),
                }
            }
        }
    }

    fn cached_snapshot(&self) -> Option<WeatherSnapshot> {
        let cache = self.cache.as_ref()?;
        let guard = cache.lock();
        guard
            .fresh(self.cache_max_age, Utc::now())
            .map(|cached| cached.snapshot)
    }

    /// Analyze the primary profile and record an alert if any risk fired.
    ///
    /// # Errors
    /// `AdvisorError::NoProfile` when no primary profile exists, or a store error.
    pub async fn check_primary(&self, location: &Location) -> Result<Advisory, AdvisorError> {
        let profile = self
            .profiles
            .get_primary_profile()?
            .ok_or(AdvisorError::NoProfile)?;

        let Fetched {
            snapshot,
            source,
            notice,
        } = self.fetch(location).await;
        let analysis = self.analyzer.analyze(snapshot.as_ref(), &profile);

        let alert = match snapshot {
            Some(snapshot) if analysis.has_risks() => Some(self.alerts.record(
                analysis.risks.clone(),
                analysis.recommendations.clone(),
                snapshot,
            )?),
            _ => None,
        };

        tracing::info!(
            "Primary profile check: {} risks ({:?})",
            analysis.risks.len(),
            source
        );

        Ok(Advisory {
            profile_id: profile.id,
            snapshot,
            source,
            analysis,
            alert,
            notice,
        })
    }

    /// Current risks for every family member. Nothing is recorded.
    ///
    /// # Errors
    /// Returns a store error if the family list cannot be read.
    pub async fn check_family(&self, location: &Location) -> Result<Vec<Advisory>, AdvisorError> {
        let members = self.profiles.list_family_members()?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let Fetched {
            snapshot,
            source,
            notice,
        } = self.fetch(location).await;
        Ok(members
            .into_iter()
            .map(|member| Advisory {
                analysis: self.analyzer.analyze(snapshot.as_ref(), &member.profile),
                profile_id: member.profile.id,
                snapshot,
                source,
                alert: None,
                notice,
            })
            .collect())
    }

    /// Record a symptom entry annotated with the weather when available.
    ///
    /// Symptoms are validated before the provider is contacted.
    ///
    /// # Errors
    /// `StoreError::Validation` when no symptom is given, or a store error.
    pub async fn log_symptoms(
        &self,
        symptoms: Vec<String>,
        severity: Severity,
        notes: Option<String>,
        location: Option<&Location>,
    ) -> Result<SymptomEntry, AdvisorError> {
        let symptoms = validate_symptoms(symptoms).map_err(StoreError::from)?;

        let weather = match location {
            Some(location) => self.current_snapshot(location).await.0,
            None => None,
        };

        Ok(self.symptoms.record(symptoms, severity, notes, weather)?)
    }

    /// # Errors
    /// Returns a store error if either history cannot be read.
    pub fn trend_report(&self, today: NaiveDate, period: ReportPeriod) -> Result<TrendReport, AdvisorError> {
        let alerts = self.alerts.list()?;
        let symptoms = self.symptoms.list()?;
        Ok(TrendReport::build(today, period, &alerts, &symptoms))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::kv::MemoryStore;
    use climahealth_health::{ProfileDraft, RiskType, Sensitivities, SensitivityLevel, ValidationError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Answer(WeatherSnapshot),
        Fail,
        Hang,
    }

    struct StubProvider {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SnapshotProvider for StubProvider {
        async fn fetch_snapshot(&self, _location: &Location) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Answer(snapshot) => Ok(*snapshot),
                Behavior::Fail => Err(WeatherError::MissingApiKey),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(WeatherError::MissingApiKey)
                }
            }
        }
    }

    fn sao_paulo() -> Location {
        Location::new(-23.5505, -46.6333)
    }

    fn advisor(behavior: Behavior) -> Advisor<StubProvider> {
        Advisor::new(StubProvider::new(behavior), MemoryStore::shared())
    }

    #[tokio::test]
    async fn test_no_profile() {
        let advisor = advisor(Behavior::Answer(WeatherSnapshot::new(20.0, 50, 3.0, 1)));
        let err = advisor.check_primary(&sao_paulo()).await.unwrap_err();
        assert!(matches!(err, AdvisorError::NoProfile));
        assert_eq!(advisor.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_risks_are_recorded() {
        let advisor = advisor(Behavior::Answer(WeatherSnapshot::new(5.0, 50, 2.0, 1)));
        advisor
            .profiles()
            .create_profile(ProfileDraft::new("Ana", 30).with_conditions(["asma"]))
            .unwrap();

        let advisory = advisor.check_primary(&sao_paulo()).await.unwrap();
        assert_eq!(advisory.source, SnapshotSource::Live);
        assert!(advisory.notice.is_none());
        assert_eq!(advisory.analysis.risks.len(), 1);
        assert_eq!(advisory.analysis.risks[0].risk_type, RiskType::Temperature);

        let alert = advisory.alert.unwrap();
        let history = advisor.alerts().list().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, alert.id);
        assert_eq!(history[0].risks, advisory.analysis.risks);
        assert_eq!(history[0].weather_data, WeatherSnapshot::new(5.0, 50, 2.0, 1));
    }

    #[tokio::test]
    async fn test_no_risks_no_alert() {
        let advisor = advisor(Behavior::Answer(WeatherSnapshot::new(20.0, 50, 3.0, 1)));
        advisor.profiles().create_profile(ProfileDraft::new("Ana", 30)).unwrap();

        let advisory = advisor.check_primary(&sao_paulo()).await.unwrap();
        assert!(advisory.analysis.risks.is_empty());
        assert!(advisory.analysis.recommendations.is_empty());
        assert!(advisory.alert.is_none());
        assert!(advisor.alerts().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_empty() {
        let advisor = advisor(Behavior::Fail);
        advisor
            .profiles()
            .create_profile(ProfileDraft::new("Ana", 30).with_conditions(["asma"]))
            .unwrap();

        let advisory = advisor.check_primary(&sao_paulo()).await.unwrap();
        assert_eq!(advisory.source, SnapshotSource::Unavailable);
        assert!(advisory.snapshot.is_none());
        assert!(advisory.notice.is_some());
        assert!(!advisory.analysis.has_risks());
        assert!(advisor.alerts().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cached = WeatherSnapshot::new(37.0, 40, 5.0, 1);
        let mut cache = WeatherCache::new(dir.path());
        cache.store(cached, &sao_paulo(), Utc::now()).unwrap();

        let advisor = advisor(Behavior::Hang)
            .with_cache(cache)
            .with_timeout(Duration::from_millis(50));
        advisor
            .profiles()
            .create_profile(ProfileDraft::new("Ana", 30).with_sensitivities(Sensitivities {
                temperature: SensitivityLevel::High,
                ..Sensitivities::default()
            }))
            .unwrap();

        let advisory = advisor.check_primary(&sao_paulo()).await.unwrap();
        assert_eq!(advisory.source, SnapshotSource::Cached);
        assert_eq!(advisory.snapshot, Some(cached));
        assert_eq!(advisory.analysis.risks[0].risk_type, RiskType::Temperature);
        assert!(advisory.alert.is_some());
    }

    #[tokio::test]
    async fn test_stale_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = WeatherCache::new(dir.path());
        cache
            .store(
                WeatherSnapshot::new(37.0, 40, 5.0, 1),
                &sao_paulo(),
                Utc::now() - chrono::Duration::hours(2),
            )
            .unwrap();

        let advisor = advisor(Behavior::Fail).with_cache(cache);
        let (snapshot, source) = advisor.current_snapshot(&sao_paulo()).await;
        assert!(snapshot.is_none());
        assert_eq!(source, SnapshotSource::Unavailable);
    }

    #[tokio::test]
    async fn test_live_snapshot_refreshes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let live = WeatherSnapshot::new(22.0, 55, 4.0, 2);
        let advisor = advisor(Behavior::Answer(live)).with_cache(WeatherCache::new(dir.path()));

        advisor.current_snapshot(&sao_paulo()).await;

        let reopened = WeatherCache::open(dir.path());
        assert_eq!(reopened.latest().unwrap().snapshot, live);
    }

    #[tokio::test]
    async fn test_family_check_records_nothing() {
        let advisor = advisor(Behavior::Answer(WeatherSnapshot::new(20.0, 85, 3.0, 4)));
        let profiles = advisor.profiles();
        profiles
            .add_family_member(ProfileDraft::new("Vó", 80).with_conditions(["Artrite"]), "Avô/Avó")
            .unwrap();
        profiles
            .add_family_member(ProfileDraft::new("Bia", 8).with_conditions(["Bronquite"]), "Filho(a)")
            .unwrap();

        let advisories = advisor.check_family(&sao_paulo()).await.unwrap();
        assert_eq!(advisories.len(), 2);
        assert_eq!(advisories[0].analysis.risks[0].risk_type, RiskType::Humidity);
        assert_eq!(advisories[1].analysis.risks[0].risk_type, RiskType::AirQuality);
        assert!(advisories.iter().all(|a| a.alert.is_none()));
        assert!(advisor.alerts().list().unwrap().is_empty());
        assert_eq!(advisor.provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_log_symptoms_validates_before_fetch() {
        let advisor = advisor(Behavior::Answer(WeatherSnapshot::new(20.0, 50, 3.0, 1)));

        let err = advisor
            .log_symptoms(vec!["  ".into()], Severity::Low, None, Some(&sao_paulo()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::Store(StoreError::Validation(ValidationError::NoSymptoms))
        ));
        assert_eq!(advisor.provider.calls(), 0);
        assert!(advisor.symptoms().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_symptoms_with_and_without_weather() {
        let advisor = advisor(Behavior::Fail);

        let entry = advisor
            .log_symptoms(vec!["Tosse".into()], Severity::High, None, Some(&sao_paulo()))
            .await
            .unwrap();
        assert!(entry.weather.is_none());

        let entry = advisor
            .log_symptoms(vec!["Fadiga".into()], Severity::Low, Some("leve".into()), None)
            .await
            .unwrap();
        assert_eq!(entry.notes, "leve");
        assert_eq!(advisor.provider.calls(), 1);
        assert_eq!(advisor.symptoms().list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_trend_report_counts_todays_history() {
        let advisor = advisor(Behavior::Answer(WeatherSnapshot::new(5.0, 50, 7.0, 1)));
        advisor
            .profiles()
            .create_profile(ProfileDraft::new("Ana", 30).with_conditions(["asma"]))
            .unwrap();
        advisor.check_primary(&sao_paulo()).await.unwrap();
        advisor
            .log_symptoms(vec!["Tosse".into()], Severity::Medium, None, Some(&sao_paulo()))
            .await
            .unwrap();

        let report = advisor
            .trend_report(Utc::now().date_naive(), ReportPeriod::Week)
            .unwrap();
        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.total_risks(), 2);
        assert_eq!(report.total_symptoms(), 1);
        let today = report.daily.last().unwrap();
        assert_eq!(today.temperature.unwrap().avg, 5.0);
    }

    #[test]
    fn test_error_maps_to_app_error() {
        let app: AppError = AdvisorError::NoProfile.into();
        assert!(matches!(app, AppError::Validation(_)));
    }
}
