use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The weather factor a risk is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskType {
    Temperature,
    Humidity,
    AirQuality,
    Uv,
}

/// A single flagged health concern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRisk {
    pub level: RiskLevel,
    #[serde(rename = "type")]
    pub risk_type: RiskType,
    pub message: String,
}

impl HealthRisk {
    pub fn new(level: RiskLevel, risk_type: RiskType, message: impl Into<String>) -> Self {
        Self {
            level,
            risk_type,
            message: message.into(),
        }
    }
}
