//! Health profiles: the primary user and family members.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::conditions::ConditionMatching;

pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 120;

/// Input rejected before any store is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Age must be between 1 and 120, got {0}")]
    AgeOutOfRange(u32),

    #[error("Relationship cannot be empty")]
    EmptyRelationship,

    #[error("At least one symptom is required")]
    NoSymptoms,
}

/// Qualitative sensitivity to one weather factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    Low,
    #[default]
    Normal,
    High,
}

/// Per-factor sensitivities. Missing factors deserialize as `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sensitivities {
    pub temperature: SensitivityLevel,
    pub humidity: SensitivityLevel,
    pub air_quality: SensitivityLevel,
    pub uv: SensitivityLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
    pub id: String,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub sensitivities: Sensitivities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
}

/// Fields submitted when creating a profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub age: u32,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
    pub sensitivities: Sensitivities,
    pub emergency_contact: Option<String>,
}

impl ProfileDraft {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            ..Self::default()
        }
    }

    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sensitivities(mut self, sensitivities: Sensitivities) -> Self {
        self.sensitivities = sensitivities;
        self
    }
}

impl HealthProfile {
    /// Validate the draft and assign a fresh id.
    ///
    /// # Errors
    /// Returns `ValidationError` if the name is blank or the age is outside 1-120.
    pub fn create(draft: ProfileDraft) -> Result<Self, ValidationError> {
        validate_identity(&draft.name, draft.age)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            age: draft.age,
            conditions: normalize_labels(draft.conditions),
            medications: normalize_labels(draft.medications),
            allergies: normalize_labels(draft.allergies),
            sensitivities: draft.sensitivities,
            emergency_contact: clean_optional(draft.emergency_contact),
        })
    }

    /// # Errors
    /// Returns `ValidationError` if the name is blank or the age is outside 1-120.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_identity(&self.name, self.age)
    }

    /// Trim text fields and drop duplicate or blank labels.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.conditions = normalize_labels(self.conditions);
        self.medications = normalize_labels(self.medications);
        self.allergies = normalize_labels(self.allergies);
        self.emergency_contact = clean_optional(self.emergency_contact);
        self
    }

    pub fn has_condition(&self, keyword: &str, matching: ConditionMatching) -> bool {
        self.conditions.iter().any(|c| matching.matches(c, keyword))
    }

    /// Returns false when the label was blank or already present.
    pub fn add_condition(&mut self, label: &str) -> bool {
        add_label(&mut self.conditions, label)
    }

    pub fn add_medication(&mut self, label: &str) -> bool {
        add_label(&mut self.medications, label)
    }

    pub fn add_allergy(&mut self, label: &str) -> bool {
        add_label(&mut self.allergies, label)
    }

    pub fn remove_condition(&mut self, label: &str) -> bool {
        remove_label(&mut self.conditions, label)
    }
}

/// A profile belonging to someone other than the primary user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    #[serde(flatten)]
    pub profile: HealthProfile,
    pub relationship: String,
}

impl FamilyMember {
    /// # Errors
    /// Returns `ValidationError` for an invalid profile or a blank relationship.
    pub fn create(
        draft: ProfileDraft,
        relationship: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let relationship = relationship.into().trim().to_string();
        if relationship.is_empty() {
            return Err(ValidationError::EmptyRelationship);
        }
        Ok(Self {
            profile: HealthProfile::create(draft)?,
            relationship,
        })
    }

    /// # Errors
    /// Returns `ValidationError` for an invalid profile or a blank relationship.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.profile.validate()?;
        if self.relationship.trim().is_empty() {
            return Err(ValidationError::EmptyRelationship);
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }
}

fn validate_identity(name: &str, age: u32) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(ValidationError::AgeOutOfRange(age));
    }
    Ok(())
}

/// Trim every label, drop blanks and keep only the first of any duplicates.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        add_label(&mut out, label.as_ref());
    }
    out
}

fn add_label(labels: &mut Vec<String>, label: &str) -> bool {
    let label = label.trim();
    if label.is_empty() || labels.iter().any(|l| l == label) {
        return false;
    }
    labels.push(label.to_string());
    true
}

fn remove_label(labels: &mut Vec<String>, label: &str) -> bool {
    let before = labels.len();
    labels.retain(|l| l != label.trim());
    labels.len() != before
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_create_assigns_unique_ids() {
        let a = HealthProfile::create(ProfileDraft::new("Ana", 34)).unwrap();
        let b = HealthProfile::create(ProfileDraft::new("Ana", 34)).unwrap();
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let result = HealthProfile::create(ProfileDraft::new("   ", 30));
        assert_eq!(result, Err(ValidationError::EmptyName));
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        assert!(HealthProfile::create(ProfileDraft::new("Bebê", 1)).is_ok());
        assert!(HealthProfile::create(ProfileDraft::new("Bisavó", 120)).is_ok());
        assert_eq!(
            HealthProfile::create(ProfileDraft::new("Zero", 0)),
            Err(ValidationError::AgeOutOfRange(0))
        );
        assert_eq!(
            HealthProfile::create(ProfileDraft::new("Velho", 121)),
            Err(ValidationError::AgeOutOfRange(121))
        );
    }

    #[test]
    fn test_duplicate_labels_are_suppressed() {
        let draft = ProfileDraft::new("Ana", 34).with_conditions(["asma", " asma ", "", "artrite"]);
        let profile = HealthProfile::create(draft).unwrap();
        assert_eq!(profile.conditions, vec!["asma", "artrite"]);
    }

    #[test]
    fn test_add_and_remove_labels() {
        let mut profile = HealthProfile::create(ProfileDraft::new("Ana", 34)).unwrap();
        assert!(profile.add_condition("Asma"));
        assert!(!profile.add_condition("Asma"));
        assert!(!profile.add_condition("  "));
        assert!(profile.add_allergy("Pólen"));
        assert!(profile.add_medication("Salbutamol"));
        assert!(profile.remove_condition("Asma"));
        assert!(!profile.remove_condition("Asma"));
        assert!(profile.conditions.is_empty());
    }

    #[test]
    fn test_partial_sensitivities_default_to_normal() {
        let profile: HealthProfile = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Ana",
            "age": 34,
            "sensitivities": { "temperature": "high" }
        }))
        .unwrap();

        assert_eq!(profile.sensitivities.temperature, SensitivityLevel::High);
        assert_eq!(profile.sensitivities.humidity, SensitivityLevel::Normal);
        assert_eq!(profile.sensitivities.air_quality, SensitivityLevel::Normal);
        assert_eq!(profile.sensitivities.uv, SensitivityLevel::Normal);
        assert!(profile.conditions.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut draft = ProfileDraft::new("Ana", 34);
        draft.emergency_contact = Some("(11) 99999-0000".into());
        let profile = HealthProfile::create(draft).unwrap();
        let value = serde_json::to_value(&profile).unwrap();

        assert!(value.get("emergencyContact").is_some());
        assert_eq!(value["sensitivities"]["airQuality"], "normal");
    }

    #[test]
    fn test_family_member_requires_relationship() {
        let result = FamilyMember::create(ProfileDraft::new("Lucas", 8), " ");
        assert_eq!(result, Err(ValidationError::EmptyRelationship));

        let member = FamilyMember::create(ProfileDraft::new("Lucas", 8), "Filho(a)").unwrap();
        assert_eq!(member.relationship, "Filho(a)");
        assert!(member.validate().is_ok());
    }

    #[test]
    fn test_family_member_serializes_flat() {
        let member = FamilyMember::create(ProfileDraft::new("Lucas", 8), "Filho(a)").unwrap();
        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value["name"], "Lucas");
        assert_eq!(value["relationship"], "Filho(a)");

        let back: FamilyMember = serde_json::from_value(value).unwrap();
        assert_eq!(back, member);
    }
}
