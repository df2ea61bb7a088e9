use std::collections::BTreeMap;

use serde_json::json;

use super::types::{CannedResponse, Chunk, ChunkKind, KnowledgeBase, Scenario, TaskPattern};

/// Character cap for the clinical-note preview used as embedding text.
/// The full note is kept in chunk metadata for generation-time display.
const NOTE_PREVIEW_CHARS: usize = 500;

/// Turn the knowledge base into an ordered sequence of retrievable chunks.
///
/// Pure and deterministic: identical input yields byte-identical chunk ids
/// and text. Scenarios come first in source order, then canned responses in
/// key order. A chunk with no derivable content is skipped, never emitted
/// empty.
pub fn extract_chunks(kb: &KnowledgeBase) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for scenario in &kb.scenarios {
        extract_scenario_chunks(scenario, &mut chunks);
    }

    for (key, response) in &kb.api_responses {
        extract_response_chunks(key, response, &mut chunks);
    }

    tracing::info!(count = chunks.len(), "Extracted chunks from knowledge base");
    chunks
}

fn extract_scenario_chunks(scenario: &Scenario, chunks: &mut Vec<Chunk>) {
    let form = &scenario.form_data;
    let cc = form.chief_complaint.as_str();

    // Overview chunk — skipped only when the scenario carries no content at all.
    if !(scenario.name.is_empty()
        && scenario.description.is_empty()
        && cc.is_empty()
        && form.associated_symptoms.is_empty())
    {
        let text = format!(
            "Clinical Scenario: {}\nDescription: {}\nChief Complaint: {}\nAssociated Symptoms: {}",
            scenario.name,
            scenario.description,
            cc,
            form.associated_symptoms.join(", ")
        );
        chunks.push(Chunk {
            id: format!("scenario_{}_overview", scenario.id),
            kind: ChunkKind::ScenarioOverview,
            source_ref: scenario.id.clone(),
            text,
            metadata: metadata([
                ("chief_complaint", json!(cc)),
                ("symptoms", json!(form.associated_symptoms)),
            ]),
        });
    }

    if let Some(hpi) = &form.hpi {
        let severity = hpi
            .severity
            .map(|s| format!("{s}/10"))
            .unwrap_or_default();
        let text = format!(
            "Clinical Pattern - History of Present Illness:\n\
             Chief Complaint: {}\n\
             Location: {}\n\
             Radiation: {}\n\
             Quality: {} {}\n\
             Duration: {}\n\
             Severity: {}\n\
             Timing: {}\n\
             Aggravating Factors: {}\n\
             Relieving Factors: {}",
            cc,
            hpi.location.join(", "),
            hpi.radiation.join(", "),
            hpi.quality.join(", "),
            hpi.quality_other,
            hpi.duration,
            severity,
            hpi.timing,
            hpi.aggravating_factors.join(", "),
            hpi.relieving_factors.join(", "),
        );
        chunks.push(Chunk {
            id: format!("scenario_{}_hpi", scenario.id),
            kind: ChunkKind::HpiPattern,
            source_ref: scenario.id.clone(),
            text,
            metadata: metadata([("chief_complaint", json!(cc))]),
        });
    }

    if let Some(pe) = &form.physical_exam {
        let text = format!(
            "Physical Examination Pattern for {}:\n\
             General: {}\n\
             Vitals: BP {}, HR {}, Temp {}, SpO2 {}%, RR {}\n\
             Cardiovascular: {}\n\
             Respiratory: {}",
            cc,
            pe.general.join(", "),
            pe.vitals.bp,
            pe.vitals.hr,
            pe.vitals.temp,
            pe.vitals.spo2,
            pe.vitals.rr,
            pe.cardiovascular.join(", "),
            pe.respiratory.join(", "),
        );
        chunks.push(Chunk {
            id: format!("scenario_{}_pe", scenario.id),
            kind: ChunkKind::PhysicalExamPattern,
            source_ref: scenario.id.clone(),
            text,
            metadata: metadata([("chief_complaint", json!(cc))]),
        });
    }

    if let Some(notes) = form.doctor_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let text = format!("Clinical Reasoning for {cc}:\n{}", notes.trim());
        chunks.push(Chunk {
            id: format!("scenario_{}_notes", scenario.id),
            kind: ChunkKind::ClinicalReasoning,
            source_ref: scenario.id.clone(),
            text,
            metadata: metadata([("chief_complaint", json!(cc))]),
        });
    }
}

fn extract_response_chunks(key: &str, response: &CannedResponse, chunks: &mut Vec<Chunk>) {
    if let Some(note) = response
        .clinical_note
        .as_deref()
        .filter(|n| !n.trim().is_empty())
    {
        chunks.push(Chunk {
            id: format!("response_{key}_note"),
            kind: ChunkKind::ClinicalNotePattern,
            source_ref: key.to_string(),
            text: format!("Clinical Note Pattern:\n{}", note_preview(note)),
            metadata: metadata([("full_note", json!(note))]),
        });
    }

    for (i, dx) in response.differential_diagnoses.iter().enumerate() {
        let text = format!(
            "Differential Diagnosis Pattern:\n\
             Diagnosis: {}\n\
             Risk Level: {}\n\
             Supporting Evidence: {}\n\
             Opposing Evidence: {}\n\
             Recommended Actions: {}",
            dx.diagnosis,
            dx.risk_level,
            dx.supporting_evidence.join(", "),
            dx.opposing_evidence.join(", "),
            dx.recommended_actions.join(", "),
        );
        chunks.push(Chunk {
            id: format!("response_{key}_dx_{i}"),
            kind: ChunkKind::DifferentialDiagnosis,
            source_ref: key.to_string(),
            text,
            metadata: metadata([
                ("diagnosis", json!(dx.diagnosis)),
                ("risk_level", json!(dx.risk_level)),
                ("rank", json!(dx.rank.unwrap_or(i as u32 + 1))),
            ]),
        });
    }

    let tiers: [(&str, &str, &[TaskPattern]); 3] = [
        ("immediate_tasks", "IMMEDIATE", &response.tasks.immediate_tasks),
        ("urgent_tasks", "URGENT", &response.tasks.urgent_tasks),
        ("routine_tasks", "ROUTINE", &response.tasks.routine_tasks),
    ];
    for (tier_key, priority, tasks) in tiers {
        if tasks.is_empty() {
            continue;
        }
        let lines: Vec<String> = tasks
            .iter()
            .map(|t| format!("- {} ({}): {}", t.task, t.category, t.reason))
            .collect();
        chunks.push(Chunk {
            id: format!("response_{key}_{tier_key}"),
            kind: ChunkKind::TaskPattern,
            source_ref: key.to_string(),
            text: format!("Clinical Tasks - {priority} Priority:\n{}", lines.join("\n")),
            metadata: metadata([
                ("priority", json!(priority)),
                ("task_count", json!(tasks.len())),
            ]),
        });
    }

    if !response.icd10_codes.is_empty() {
        let lines: Vec<String> = response
            .icd10_codes
            .iter()
            .map(|c| format!("- {}: {} ({})", c.code, c.description, c.kind))
            .collect();
        chunks.push(Chunk {
            id: format!("response_{key}_icd"),
            kind: ChunkKind::IcdCodes,
            source_ref: key.to_string(),
            text: format!("ICD-10 Diagnosis Codes:\n{}", lines.join("\n")),
            metadata: metadata([("codes", json!(response.icd10_codes))]),
        });
    }
}

/// Truncate a note on a character boundary for embedding text.
fn note_preview(note: &str) -> String {
    let trimmed = note.trim();
    if trimmed.chars().count() <= NOTE_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let preview: String = trimmed.chars().take(NOTE_PREVIEW_CHARS).collect();
    format!("{preview}...")
}

fn metadata<const N: usize>(
    entries: [(&str, serde_json::Value); N],
) -> BTreeMap<String, serde_json::Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
