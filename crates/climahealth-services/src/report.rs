//! Daily and weekly trend reports built from the recorded history.
//!
//! Every weather value comes from snapshots captured alongside alerts and
//! symptom entries. Days are UTC calendar days.

use chrono::{Datelike, Duration, NaiveDate};
use climahealth_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};

use crate::alert_store::AlertHistoryEntry;
use crate::symptom_store::SymptomEntry;

const HOT_WEEK_TEMPERATURE: f64 = 28.0;
const HUMID_WEEK_HUMIDITY: f64 = 70.0;
const HIGH_WEEK_UV: f64 = 6.0;
const POOR_WEEK_AIR_QUALITY: f64 = 3.0;
const SYMPTOM_VISIT_THRESHOLD: usize = 3;
const TOP_SYMPTOMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    #[default]
    Week,
    Month,
    Quarter,
}

impl ReportPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::Week => 7,
            ReportPeriod::Month => 30,
            ReportPeriod::Quarter => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Readings and events for one calendar day. Weather fields are `None` on
/// days with no recorded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    pub temperature: Option<TemperatureRange>,
    pub humidity: Option<f64>,
    pub uv_index: Option<f64>,
    pub air_quality_index: Option<f64>,
    pub risks: usize,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    /// The Sunday that opens the week
    pub week_start: NaiveDate,
    pub avg_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_uv_index: Option<f64>,
    pub avg_air_quality_index: Option<f64>,
    pub total_risks: usize,
    pub total_symptoms: usize,
    pub top_symptoms: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub period: ReportPeriod,
    pub daily: Vec<DailyReport>,
    pub weekly: Vec<WeeklySummary>,
}

impl TrendReport {
    pub fn build(
        today: NaiveDate,
        period: ReportPeriod,
        alerts: &[AlertHistoryEntry],
        symptoms: &[SymptomEntry],
    ) -> Self {
        let daily = build_daily_reports(today, period, alerts, symptoms);
        let weekly = summarize_weeks(&daily);
        Self {
            period,
            daily,
            weekly,
        }
    }

    pub fn total_risks(&self) -> usize {
        self.daily.iter().map(|d| d.risks).sum()
    }

    pub fn total_symptoms(&self) -> usize {
        self.daily.iter().map(|d| d.symptoms.len()).sum()
    }
}

/// One report per day of `period`, ending at `today`, oldest first.
pub fn build_daily_reports(
    today: NaiveDate,
    period: ReportPeriod,
    alerts: &[AlertHistoryEntry],
    symptoms: &[SymptomEntry],
) -> Vec<DailyReport> {
    (0..period.days())
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);

            let day_alerts: Vec<&AlertHistoryEntry> =
                alerts.iter().filter(|a| a.date.date_naive() == date).collect();
            let day_symptoms: Vec<&SymptomEntry> =
                symptoms.iter().filter(|s| s.date.date_naive() == date).collect();

            let snapshots: Vec<WeatherSnapshot> = day_alerts
                .iter()
                .map(|a| a.weather_data)
                .chain(day_symptoms.iter().filter_map(|s| s.weather))
                .collect();

            DailyReport {
                date,
                temperature: temperature_range(&snapshots),
                humidity: mean(snapshots.iter().map(|s| f64::from(s.humidity))),
                uv_index: mean(snapshots.iter().map(|s| s.uv_index)),
                air_quality_index: mean(snapshots.iter().map(|s| f64::from(s.air_quality_index))),
                risks: day_alerts.iter().map(|a| a.risks.len()).sum(),
                symptoms: day_symptoms
                    .iter()
                    .flat_map(|s| s.symptoms.iter().cloned())
                    .collect(),
            }
        })
        .collect()
}

/// Group daily reports into Sunday-based weeks, most recent week first.
pub fn summarize_weeks(daily: &[DailyReport]) -> Vec<WeeklySummary> {
    let mut weeks: Vec<(NaiveDate, Vec<&DailyReport>)> = Vec::new();
    for report in daily {
        let start = week_start(report.date);
        match weeks.iter_mut().find(|(s, _)| *s == start) {
            Some((_, days)) => days.push(report),
            None => weeks.push((start, vec![report])),
        }
    }

    weeks.sort_by(|a, b| b.0.cmp(&a.0));
    weeks
        .into_iter()
        .map(|(start, days)| summarize_week(start, &days))
        .collect()
}

fn summarize_week(week_start: NaiveDate, days: &[&DailyReport]) -> WeeklySummary {
    let avg_temperature = mean(days.iter().filter_map(|d| d.temperature.map(|t| t.avg)));
    let avg_humidity = mean(days.iter().filter_map(|d| d.humidity));
    let avg_uv_index = mean(days.iter().filter_map(|d| d.uv_index));
    let avg_air_quality_index = mean(days.iter().filter_map(|d| d.air_quality_index));
    let total_risks = days.iter().map(|d| d.risks).sum();
    let total_symptoms = days.iter().map(|d| d.symptoms.len()).sum();

    let mut recommendations = Vec::new();
    if avg_temperature.is_some_and(|t| t > HOT_WEEK_TEMPERATURE) {
        recommendations.push("Mantenha-se hidratado em temperaturas altas".to_string());
    }
    if avg_humidity.is_some_and(|h| h > HUMID_WEEK_HUMIDITY) {
        recommendations.push("Use desumidificador em casa".to_string());
    }
    if avg_uv_index.is_some_and(|uv| uv > HIGH_WEEK_UV) {
        recommendations.push("Use protetor solar diariamente".to_string());
    }
    if avg_air_quality_index.is_some_and(|aqi| aqi > POOR_WEEK_AIR_QUALITY) {
        recommendations.push("Evite atividades ao ar livre".to_string());
    }
    if total_symptoms > SYMPTOM_VISIT_THRESHOLD {
        recommendations.push("Considere consultar um médico".to_string());
    }

    WeeklySummary {
        week_start,
        avg_temperature: avg_temperature.map(round_tenth),
        avg_humidity: avg_humidity.map(f64::round),
        avg_uv_index: avg_uv_index.map(round_tenth),
        avg_air_quality_index: avg_air_quality_index.map(round_tenth),
        total_risks,
        total_symptoms,
        top_symptoms: top_symptoms(days),
        recommendations,
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Most frequent symptoms; ties keep first-seen order.
fn top_symptoms(days: &[&DailyReport]) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for symptom in days.iter().flat_map(|d| d.symptoms.iter()) {
        match counts.iter_mut().find(|(s, _)| *s == symptom.as_str()) {
            Some((_, n)) => *n += 1,
            None => counts.push((symptom.as_str(), 1)),
        }
    }
    // stable sort keeps first appearance among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_SYMPTOMS)
        .map(|(s, _)| s.to_string())
        .collect()
}

fn temperature_range(snapshots: &[WeatherSnapshot]) -> Option<TemperatureRange> {
    let avg = mean(snapshots.iter().map(|s| s.temperature))?;
    let min = snapshots.iter().map(|s| s.temperature).fold(f64::INFINITY, f64::min);
    let max = snapshots.iter().map(|s| s.temperature).fold(f64::NEG_INFINITY, f64::max);
    Some(TemperatureRange { min, max, avg })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::symptom_store::Severity;
    use chrono::{DateTime, TimeZone, Utc};
    use climahealth_health::{HealthRisk, RiskLevel, RiskType};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
    }

    fn alert(date: DateTime<Utc>, risks: usize, weather: WeatherSnapshot) -> AlertHistoryEntry {
        AlertHistoryEntry {
            id: format!("a-{}", date.timestamp()),
            date,
            risks: (0..risks)
                .map(|_| HealthRisk::new(RiskLevel::Medium, RiskType::Uv, "uv"))
                .collect(),
            recommendations: vec![],
            weather_data: weather,
            acknowledged: false,
        }
    }

    fn symptom(date: DateTime<Utc>, labels: &[&str], weather: Option<WeatherSnapshot>) -> SymptomEntry {
        SymptomEntry {
            id: format!("s-{}", date.timestamp()),
            date,
            symptoms: labels.iter().map(|s| s.to_string()).collect(),
            severity: Severity::Medium,
            notes: String::new(),
            weather,
        }
    }

    #[test]
    fn test_period_days() {
        assert_eq!(ReportPeriod::Week.days(), 7);
        assert_eq!(ReportPeriod::Month.days(), 30);
        assert_eq!(ReportPeriod::Quarter.days(), 90);
    }

    #[test]
    fn test_daily_reports_cover_period_oldest_first() {
        let today = day(2024, 3, 20);
        let reports = build_daily_reports(today, ReportPeriod::Month, &[], &[]);
        assert_eq!(reports.len(), 30);
        assert_eq!(reports[0].date, day(2024, 2, 20));
        assert_eq!(reports[29].date, today);
        assert!(reports.iter().all(|r| r.temperature.is_none() && r.risks == 0));
    }

    #[test]
    fn test_daily_aggregates_alerts_and_symptoms() {
        let today = day(2024, 1, 17);
        let alerts = vec![
            alert(at(today, 14), 2, WeatherSnapshot::new(30.0, 60, 9.0, 2)),
            alert(at(today, 9), 1, WeatherSnapshot::new(20.0, 80, 3.0, 4)),
            alert(at(day(2024, 1, 1), 12), 5, WeatherSnapshot::new(0.0, 0, 0.0, 1)),
        ];
        let symptoms = vec![
            symptom(at(today, 20), &["Tosse", "Fadiga"], Some(WeatherSnapshot::new(25.0, 70, 0.0, 3))),
            symptom(at(today - Duration::days(1), 8), &["Espirros"], None),
        ];

        let reports = build_daily_reports(today, ReportPeriod::Week, &alerts, &symptoms);
        let last = reports.last().unwrap();

        let temp = last.temperature.unwrap();
        assert_eq!(temp.min, 20.0);
        assert_eq!(temp.max, 30.0);
        assert_eq!(temp.avg, 25.0);
        assert_eq!(last.humidity, Some(70.0));
        assert_eq!(last.uv_index, Some(4.0));
        assert_eq!(last.air_quality_index, Some(3.0));
        assert_eq!(last.risks, 3);
        assert_eq!(last.symptoms, vec!["Tosse", "Fadiga"]);

        let yesterday = &reports[reports.len() - 2];
        assert!(yesterday.temperature.is_none());
        assert_eq!(yesterday.symptoms, vec!["Espirros"]);
        assert_eq!(yesterday.risks, 0);
    }

    #[test]
    fn test_weeks_start_on_sunday_most_recent_first() {
        // 2024-01-14 and 2024-01-21 are Sundays
        let today = day(2024, 1, 23);
        let reports = build_daily_reports(today, ReportPeriod::Week, &[], &[]);
        let weeks = summarize_weeks(&reports);

        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, day(2024, 1, 21));
        assert_eq!(weeks[1].week_start, day(2024, 1, 14));
        assert!(weeks[0].recommendations.is_empty());
        assert_eq!(weeks[0].avg_temperature, None);
    }

    #[test]
    fn test_weekly_rounding_and_recommendations() {
        let today = day(2024, 1, 17);
        let alerts = vec![
            alert(at(today, 12), 1, WeatherSnapshot::new(30.06, 75, 7.04, 4)),
            alert(at(day(2024, 1, 16), 12), 2, WeatherSnapshot::new(29.0, 76, 7.0, 4)),
        ];
        let symptoms = vec![
            symptom(at(today, 18), &["Tosse", "Fadiga"], None),
            symptom(at(day(2024, 1, 15), 18), &["Fadiga", "Dor de cabeça"], None),
        ];

        let reports = build_daily_reports(today, ReportPeriod::Week, &alerts, &symptoms);
        let weeks = summarize_weeks(&reports);
        let week = &weeks[0];

        assert_eq!(week.week_start, day(2024, 1, 14));
        assert_eq!(week.avg_temperature, Some(29.5));
        assert_eq!(week.avg_humidity, Some(76.0));
        assert_eq!(week.avg_uv_index, Some(7.0));
        assert_eq!(week.avg_air_quality_index, Some(4.0));
        assert_eq!(week.total_risks, 3);
        assert_eq!(week.total_symptoms, 4);
        assert_eq!(week.top_symptoms, vec!["Fadiga", "Dor de cabeça", "Tosse"]);
        assert_eq!(
            week.recommendations,
            vec![
                "Mantenha-se hidratado em temperaturas altas",
                "Use desumidificador em casa",
                "Use protetor solar diariamente",
                "Evite atividades ao ar livre",
                "Considere consultar um médico",
            ]
        );
    }

    #[test]
    fn test_three_symptoms_do_not_trigger_visit() {
        let today = day(2024, 1, 17);
        let symptoms = vec![symptom(at(today, 9), &["Tosse", "Fadiga", "Espirros"], None)];
        let weeks = summarize_weeks(&build_daily_reports(today, ReportPeriod::Week, &[], &symptoms));
        let current = &weeks[0];
        assert_eq!(current.total_symptoms, 3);
        assert!(current.recommendations.is_empty());
    }
}
