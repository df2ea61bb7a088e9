use super::types::{EncounterForm, PatientContext};

/// Build the retrieval query from the encounter form and patient context.
///
/// Field order is fixed and only present fields are rendered, each as
/// `"Label: value"` joined by `" | "`. Retrieval quality depends on stable
/// phrasing, so this must stay deterministic.
pub fn build_query(form: &EncounterForm, patient: &PatientContext) -> String {
    let mut parts = Vec::new();

    if let Some(cc) = form.chief_complaint.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Chief complaint: {cc}"));
    }

    if !form.associated_symptoms.is_empty() {
        parts.push(format!("Symptoms: {}", form.associated_symptoms.join(", ")));
    }

    if let Some(hpi) = &form.hpi {
        if !hpi.location.is_empty() {
            parts.push(format!("Location: {}", hpi.location.join(", ")));
        }
        if !hpi.quality.is_empty() {
            parts.push(format!("Quality: {}", hpi.quality.join(", ")));
        }
        if let Some(severity) = hpi.severity {
            parts.push(format!("Severity: {severity}/10"));
        }
    }

    if let Some(age) = patient.age {
        parts.push(format!("Age: {age}"));
    }
    if let Some(gender) = patient.gender.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Gender: {gender}"));
    }

    parts.join(" | ")
}
