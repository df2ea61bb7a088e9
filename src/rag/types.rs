use serde::{Deserialize, Serialize};

use crate::knowledge::types::{Chunk, Hpi, PhysicalExam};

/// Clinical form data for a live encounter, as captured by the frontend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterForm {
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub associated_symptoms: Vec<String>,
    #[serde(default)]
    pub hpi: Option<Hpi>,
    #[serde(default)]
    pub physical_exam: Option<PhysicalExam>,
    #[serde(default)]
    pub doctor_notes: Option<String>,
}

/// Patient demographics and history accompanying an encounter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub mrn: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub vitals: Option<ContextVitals>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextVitals {
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub heart_rate: Option<f32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub oxygen_saturation: Option<f32>,
    #[serde(default)]
    pub respiratory_rate: Option<f32>,
}

/// A chunk with its relevance score, produced per query and never persisted.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// The structured analysis returned to the caller. Always fully populated:
/// the repair step fills missing optional substructure with defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub clinical_note: ClinicalNote,
    pub icd10_codes: Vec<Icd10Code>,
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    pub recommended_actions: RecommendedActions,
}

/// Four named prose sections in SOAP order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub subjective: String,
    pub objective: String,
    pub assessment: String,
    pub plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Icd10Code {
    pub code: String,
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: CodeKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Primary,
    Secondary,
    #[default]
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentialDiagnosis {
    pub name: String,
    #[serde(default)]
    pub risk: RiskLevel,
    #[serde(default)]
    pub supporting_factors: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[serde(alias = "High", alias = "high")]
    High,
    #[serde(alias = "Medium", alias = "medium")]
    Medium,
    #[serde(alias = "Low", alias = "low")]
    Low,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Three-tier action list. All tiers always present, possibly empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendedActions {
    pub immediate: Vec<ActionItem>,
    pub urgent: Vec<ActionItem>,
    pub routine: Vec<ActionItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub details: String,
}

/// Which rung of the degradation ladder produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationPath {
    Grounded,
    Fallback,
    Minimal,
}

/// Entry-point output: the analysis plus how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub path: GenerationPath,
    /// Retrieved patterns that grounded the prompt (zero on fallback/minimal).
    pub patterns_used: usize,
}
