use serde::Deserialize;

use super::types::{
    ActionItem, AnalysisResult, ClinicalNote, DifferentialDiagnosis, Icd10Code,
    RecommendedActions,
};
use super::RagError;

/// Parse a generation response into a fully repaired `AnalysisResult`.
///
/// Lenient by design: missing optional substructure is filled with defaults
/// and malformed list items are skipped. Only a response that is not valid
/// JSON at all is an error — that is the signal that drives the fallback
/// transition.
pub fn parse_analysis(response: &str) -> Result<AnalysisResult, RagError> {
    let json_str = strip_json_fence(response);

    let raw: RawAnalysis = serde_json::from_str(json_str)
        .map_err(|e| RagError::ResponseParsing(e.to_string()))?;

    Ok(repair(raw))
}

/// Models sometimes wrap JSON in a Markdown fence despite the response
/// format request. Strip it when present, otherwise parse the raw text.
fn strip_json_fence(response: &str) -> &str {
    let trimmed = response.trim();

    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    let body = after_fence.strip_prefix("json").unwrap_or(after_fence);

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[derive(Deserialize)]
struct RawAnalysis {
    clinical_note: Option<RawNote>,
    icd10_codes: Option<Vec<serde_json::Value>>,
    differential_diagnoses: Option<Vec<serde_json::Value>>,
    recommended_actions: Option<RawActions>,
}

#[derive(Deserialize)]
struct RawNote {
    subjective: Option<String>,
    objective: Option<String>,
    assessment: Option<String>,
    plan: Option<String>,
}

#[derive(Deserialize)]
struct RawActions {
    immediate: Option<Vec<serde_json::Value>>,
    urgent: Option<Vec<serde_json::Value>>,
    routine: Option<Vec<serde_json::Value>>,
}

/// Fill in defaults for everything the model omitted.
fn repair(raw: RawAnalysis) -> AnalysisResult {
    let note = raw.clinical_note.map_or_else(ClinicalNote::default, |n| ClinicalNote {
        subjective: n.subjective.unwrap_or_default(),
        objective: n.objective.unwrap_or_default(),
        assessment: n.assessment.unwrap_or_default(),
        plan: n.plan.unwrap_or_default(),
    });

    let codes: Vec<Icd10Code> = parse_array_lenient(raw.icd10_codes.as_deref());
    let differentials: Vec<DifferentialDiagnosis> =
        parse_array_lenient(raw.differential_diagnoses.as_deref());

    let actions = raw.recommended_actions.map_or_else(RecommendedActions::default, |a| {
        RecommendedActions {
            immediate: parse_array_lenient::<ActionItem>(a.immediate.as_deref()),
            urgent: parse_array_lenient::<ActionItem>(a.urgent.as_deref()),
            routine: parse_array_lenient::<ActionItem>(a.routine.as_deref()),
        }
    });

    AnalysisResult {
        clinical_note: note,
        icd10_codes: codes,
        differential_diagnoses: differentials,
        recommended_actions: actions,
    }
}

/// Parse an array leniently — skip items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(
    items: Option<&[serde_json::Value]>,
) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}
