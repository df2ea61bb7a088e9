use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root of the knowledge-base document (`patients-data.json`).
///
/// `api_responses` is a `BTreeMap` so extraction order is stable regardless
/// of the JSON object order on disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub patient: Option<PatientRecord>,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub api_responses: BTreeMap<String, CannedResponse>,
}

/// Demographics block of the knowledge base, served to the API layer as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: u64,
    pub mrn: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub vitals: Option<BaselineVitals>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineVitals {
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

/// A reference clinical scenario in the knowledge base.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub form_data: ScenarioForm,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioForm {
    #[serde(default)]
    pub chief_complaint: String,
    #[serde(default)]
    pub associated_symptoms: Vec<String>,
    #[serde(default)]
    pub hpi: Option<Hpi>,
    #[serde(default)]
    pub physical_exam: Option<PhysicalExam>,
    #[serde(default)]
    pub doctor_notes: Option<String>,
}

/// History of present illness. Live encounter forms share this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hpi {
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub radiation: Vec<String>,
    #[serde(default)]
    pub quality: Vec<String>,
    #[serde(default)]
    pub quality_other: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub severity: Option<f32>,
    #[serde(default)]
    pub timing: String,
    #[serde(default)]
    pub aggravating_factors: Vec<String>,
    #[serde(default)]
    pub relieving_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalExam {
    #[serde(default)]
    pub general: Vec<String>,
    #[serde(default)]
    pub vitals: ExamVitals,
    #[serde(default)]
    pub cardiovascular: Vec<String>,
    #[serde(default)]
    pub respiratory: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExamVitals {
    #[serde(default)]
    pub bp: String,
    #[serde(default)]
    pub hr: String,
    #[serde(default)]
    pub temp: String,
    #[serde(default)]
    pub spo2: String,
    #[serde(default)]
    pub rr: String,
}

/// A canned clinical response record: note, differentials, tasks, codes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CannedResponse {
    #[serde(default)]
    pub clinical_note: Option<String>,
    #[serde(default)]
    pub differential_diagnoses: Vec<DifferentialPattern>,
    #[serde(default)]
    pub tasks: TaskTiers,
    #[serde(default)]
    pub icd10_codes: Vec<CodePattern>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DifferentialPattern {
    pub diagnosis: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub supporting_evidence: Vec<String>,
    #[serde(default)]
    pub opposing_evidence: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskTiers {
    #[serde(default)]
    pub immediate_tasks: Vec<TaskPattern>,
    #[serde(default)]
    pub urgent_tasks: Vec<TaskPattern>,
    #[serde(default)]
    pub routine_tasks: Vec<TaskPattern>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskPattern {
    pub task: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodePattern {
    pub code: String,
    pub description: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Tag set for retrievable chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    ScenarioOverview,
    HpiPattern,
    PhysicalExamPattern,
    ClinicalReasoning,
    ClinicalNotePattern,
    DifferentialDiagnosis,
    TaskPattern,
    IcdCodes,
}

/// An atomic, independently retrievable piece of knowledge-base text.
///
/// `text` is never empty — extraction skips a chunk rather than emitting a
/// placeholder. `metadata` carries auxiliary fields for display/filtering,
/// not for search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub kind: ChunkKind,
    /// Originating scenario id or response key.
    pub source_ref: String,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}
