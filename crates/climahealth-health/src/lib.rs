//! Health profiles and the weather risk engine.

pub mod analysis;
pub mod conditions;
pub mod profile;
pub mod risk;

pub use analysis::{analyze, Analysis, RiskAnalyzer};
pub use conditions::ConditionMatching;
pub use profile::{
    normalize_labels, FamilyMember, HealthProfile, ProfileDraft, Sensitivities, SensitivityLevel,
    ValidationError,
};
pub use risk::{HealthRisk, RiskLevel, RiskType};
