//! Known labels offered by the profile and symptom forms, and the comparison
//! used when rules look for a condition keyword.

use serde::{Deserialize, Serialize};

/// Rule keyword for asthma
pub const ASTHMA: &str = "asma";
/// Rule keyword for bronchitis
pub const BRONCHITIS: &str = "bronquite";
/// Rule keyword for arthritis
pub const ARTHRITIS: &str = "artrite";

pub const KNOWN_CONDITIONS: &[&str] = &[
    "Asma",
    "Bronquite",
    "Artrite",
    "Hipertensão",
    "Diabetes",
    "Enxaqueca",
    "Rinite Alérgica",
    "Sinusite",
    "Problemas Cardíacos",
    "Problemas de Pele",
    "Osteoporose",
    "Fibromialgia",
];

pub const KNOWN_ALLERGIES: &[&str] = &[
    "Pólen",
    "Ácaros",
    "Poeira",
    "Pelos de Animais",
    "Mofo",
    "Produtos Químicos",
    "Perfumes",
    "Alimentos",
    "Medicamentos",
    "Látex",
];

pub const KNOWN_SYMPTOMS: &[&str] = &[
    "Dor de cabeça",
    "Fadiga",
    "Dificuldade para respirar",
    "Tosse",
    "Espirros",
    "Olhos irritados",
    "Nariz entupido",
    "Dor nas articulações",
    "Dor muscular",
    "Irritação na pele",
    "Tontura",
    "Náusea",
    "Insônia",
    "Ansiedade",
    "Palpitações",
];

pub const RELATIONSHIPS: &[&str] = &[
    "Filho(a)",
    "Cônjuge",
    "Pai/Mãe",
    "Avô/Avó",
    "Irmão/Irmã",
    "Outro",
];

/// How a profile's free-text conditions are compared with rule keywords.
///
/// The default is `Normalized`, which departs from a strict case-sensitive
/// comparison: `"ASMA"` and `"Asma"` both match the asthma rule. Choose
/// `Exact` for byte-for-byte matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionMatching {
    /// Byte-for-byte: only `"asma"` matches `"asma"`.
    Exact,
    /// Trimmed, case- and accent-insensitive: `" Asma "` matches `"asma"`.
    #[default]
    Normalized,
}

impl ConditionMatching {
    pub fn matches(&self, label: &str, keyword: &str) -> bool {
        match self {
            Self::Exact => label == keyword,
            Self::Normalized => fold_label(label) == fold_label(keyword),
        }
    }
}

/// Lowercase, trim and strip the diacritics used in Portuguese.
pub fn fold_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
