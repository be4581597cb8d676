//! Rule engine mapping a weather snapshot and a health profile to risks and
//! recommendations.
//!
//! Rule groups run in a fixed order (temperature, UV, air quality, humidity)
//! and each group appends its risks and recommendations in its own order.
//! Callers rely on that ordering.

use climahealth_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};

use crate::conditions::{ConditionMatching, ARTHRITIS, ASTHMA, BRONCHITIS};
use crate::profile::{HealthProfile, SensitivityLevel};
use crate::risk::{HealthRisk, RiskLevel, RiskType};

/// Heat rule fires strictly above this temperature (°C).
pub const HEAT_THRESHOLD_C: f64 = 35.0;
/// Cold rule fires strictly below this temperature (°C).
pub const COLD_THRESHOLD_C: f64 = 10.0;
/// UV rule fires strictly above this index.
pub const UV_ALERT_INDEX: f64 = 6.0;
/// Above this index the UV risk is high instead of medium.
pub const UV_SEVERE_INDEX: f64 = 8.0;
/// Air-quality rule fires strictly above this category.
pub const POOR_AIR_QUALITY_INDEX: u8 = 3;
/// Humidity rule fires strictly above this percentage.
pub const HIGH_HUMIDITY_PERCENT: u8 = 80;

pub const MSG_HEAT: &str = "Temperatura muito alta para seu perfil de sensibilidade";
pub const MSG_COLD_ASTHMA: &str = "Temperatura baixa pode agravar sintomas de asma";
pub const MSG_UV_SEVERE: &str = "Índice UV muito alto - risco de queimaduras";
pub const MSG_UV_HIGH: &str = "Índice UV alto - risco de queimaduras";
pub const MSG_AIR_QUALITY: &str = "Qualidade do ar ruim pode agravar condições respiratórias";
pub const MSG_HUMIDITY: &str = "Alta umidade pode aumentar dores articulares";

const RECS_HEAT: [&str; 2] = [
    "Evite exposição ao sol entre 10h e 16h",
    "Mantenha-se hidratado bebendo água regularmente",
];
const RECS_COLD_ASTHMA: [&str; 2] = [
    "Use roupas adequadas para o frio",
    "Mantenha medicação de emergência próxima",
];
const RECS_UV: [&str; 2] = ["Use protetor solar FPS 30+", "Use chapéu e óculos de sol"];
const RECS_AIR_QUALITY: [&str; 2] = [
    "Evite atividades ao ar livre",
    "Use máscara se necessário sair",
];
const RECS_HUMIDITY: [&str; 2] = [
    "Mantenha ambientes secos em casa",
    "Considere exercícios leves de alongamento",
];

/// Risks and recommendations produced together from one snapshot and profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub risks: Vec<HealthRisk>,
    pub recommendations: Vec<String>,
}

impl Analysis {
    pub fn has_risks(&self) -> bool {
        !self.risks.is_empty()
    }

    pub fn highest_level(&self) -> Option<RiskLevel> {
        self.risks.iter().map(|r| r.level).max()
    }

    fn push(&mut self, risk: HealthRisk, recommendations: [&str; 2]) {
        self.risks.push(risk);
        self.recommendations
            .extend(recommendations.iter().map(|r| r.to_string()));
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAnalyzer {
    matching: ConditionMatching,
}

impl RiskAnalyzer {
    pub fn new(matching: ConditionMatching) -> Self {
        Self { matching }
    }

    pub fn matching(&self) -> ConditionMatching {
        self.matching
    }

    /// Evaluate every rule group against the snapshot.
    ///
    /// A missing or ill-formed snapshot yields an empty analysis.
    pub fn analyze(&self, snapshot: Option<&WeatherSnapshot>, profile: &HealthProfile) -> Analysis {
        let mut analysis = Analysis::default();

        let snapshot = match snapshot {
            Some(s) if s.is_well_formed() => s,
            Some(s) => {
                tracing::warn!("Skipping analysis for ill-formed snapshot: {:?}", s);
                return analysis;
            }
            None => {
                tracing::debug!("No snapshot available, skipping analysis");
                return analysis;
            }
        };

        self.temperature_rules(snapshot, profile, &mut analysis);
        self.uv_rules(snapshot, &mut analysis);
        self.air_quality_rules(snapshot, profile, &mut analysis);
        self.humidity_rules(snapshot, profile, &mut analysis);

        tracing::debug!(
            "Analysis for profile {}: {} risks",
            profile.id,
            analysis.risks.len()
        );
        analysis
    }

    fn temperature_rules(
        &self,
        snapshot: &WeatherSnapshot,
        profile: &HealthProfile,
        analysis: &mut Analysis,
    ) {
        if snapshot.temperature > HEAT_THRESHOLD_C
            && profile.sensitivities.temperature == SensitivityLevel::High
        {
            analysis.push(
                HealthRisk::new(RiskLevel::High, RiskType::Temperature, MSG_HEAT),
                RECS_HEAT,
            );
        }

        if snapshot.temperature < COLD_THRESHOLD_C && profile.has_condition(ASTHMA, self.matching) {
            analysis.push(
                HealthRisk::new(RiskLevel::Medium, RiskType::Temperature, MSG_COLD_ASTHMA),
                RECS_COLD_ASTHMA,
            );
        }
    }

    fn uv_rules(&self, snapshot: &WeatherSnapshot, analysis: &mut Analysis) {
        if snapshot.uv_index > UV_ALERT_INDEX {
            let (level, message) = if snapshot.uv_index > UV_SEVERE_INDEX {
                (RiskLevel::High, MSG_UV_SEVERE)
            } else {
                (RiskLevel::Medium, MSG_UV_HIGH)
            };
            analysis.push(HealthRisk::new(level, RiskType::Uv, message), RECS_UV);
        }
    }

    fn air_quality_rules(
        &self,
        snapshot: &WeatherSnapshot,
        profile: &HealthProfile,
        analysis: &mut Analysis,
    ) {
        let respiratory = profile.has_condition(ASTHMA, self.matching)
            || profile.has_condition(BRONCHITIS, self.matching);

        if snapshot.air_quality_index > POOR_AIR_QUALITY_INDEX && respiratory {
            analysis.push(
                HealthRisk::new(RiskLevel::High, RiskType::AirQuality, MSG_AIR_QUALITY),
                RECS_AIR_QUALITY,
            );
        }
    }

    fn humidity_rules(
        &self,
        snapshot: &WeatherSnapshot,
        profile: &HealthProfile,
        analysis: &mut Analysis,
    ) {
        if snapshot.humidity > HIGH_HUMIDITY_PERCENT
            && profile.has_condition(ARTHRITIS, self.matching)
        {
            analysis.push(
                HealthRisk::new(RiskLevel::Medium, RiskType::Humidity, MSG_HUMIDITY),
                RECS_HUMIDITY,
            );
        }
    }
}

/// Analyze with the default (normalized) condition matching.
pub fn analyze(snapshot: Option<&WeatherSnapshot>, profile: &HealthProfile) -> Analysis {
    RiskAnalyzer::default().analyze(snapshot, profile)
}
