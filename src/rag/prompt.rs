use super::types::{EncounterForm, PatientContext, ScoredChunk};

/// Marker surfacing patient allergies in every prompt. The generation step
/// is instructed to treat anything after this marker as a hard constraint.
pub const ALLERGY_MARKER: &str = "⚠️ ALLERGIES:";

/// Allergy-safety instruction carried verbatim by every prompt variant,
/// grounded and fallback alike.
pub const ALLERGY_SAFETY_RULE: &str =
    "ALWAYS check patient allergies before recommending any medications";

pub const GROUNDED_SYSTEM_PROMPT: &str = r#"You are an expert clinical decision support system. Your role is to analyze patient presentations and provide comprehensive clinical analysis.

CRITICAL SAFETY RULES:
1. ALWAYS check patient allergies before recommending any medications
2. If patient has Penicillin allergy, do NOT recommend penicillin-based antibiotics (amoxicillin, ampicillin, etc.)
3. Flag any potential drug interactions or contraindications
4. Prioritize immediate life-threatening conditions

You must return a valid JSON object with the exact structure specified."#;

pub const FALLBACK_SYSTEM_PROMPT: &str = r#"You are a clinical decision support system. Analyze the patient presentation and provide comprehensive clinical analysis.

CRITICAL SAFETY RULES:
1. ALWAYS check patient allergies before recommending any medications
2. If patient has Penicillin allergy, do NOT recommend penicillin-based antibiotics (amoxicillin, ampicillin, etc.)

Return a valid JSON object with the required structure."#;

/// The output schema the generation call must satisfy.
const OUTPUT_SCHEMA: &str = r#"Generate a JSON response with this EXACT structure:
{
  "clinical_note": {
    "subjective": "Detailed subjective findings in SOAP format...",
    "objective": "Detailed objective findings...",
    "assessment": "Clinical assessment and impression...",
    "plan": "Detailed treatment plan..."
  },
  "icd10_codes": [
    {"code": "I20.9", "description": "Angina pectoris, unspecified", "type": "primary"},
    {"code": "R07.9", "description": "Chest pain, unspecified", "type": "secondary"}
  ],
  "differential_diagnoses": [
    {
      "name": "Diagnosis name",
      "risk": "HIGH/MEDIUM/LOW",
      "supporting_factors": ["factor1", "factor2"],
      "recommended_actions": ["action1", "action2"]
    }
  ],
  "recommended_actions": {
    "immediate": [
      {"name": "Task name", "category": "Category", "details": "Reason/details"}
    ],
    "urgent": [
      {"name": "Task name", "category": "Category", "details": "Reason/details"}
    ],
    "routine": [
      {"name": "Task name", "category": "Category", "details": "Reason/details"}
    ]
  }
}"#;

/// Render the patient context block. Missing optional fields render as
/// explicit markers so the model never has to guess absent vs. empty.
pub fn patient_summary(patient: &PatientContext) -> String {
    let mut parts = Vec::new();

    if let Some(name) = patient.name.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Name: {name}"));
    }
    if let Some(age) = patient.age {
        parts.push(format!("Age: {age} years"));
    }
    if let Some(gender) = patient.gender.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Gender: {gender}"));
    }
    if let Some(mrn) = patient.mrn.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("MRN: {mrn}"));
    }

    if patient.medical_history.is_empty() {
        parts.push("Past Medical History: None documented".to_string());
    } else {
        parts.push(format!(
            "Past Medical History: {}",
            patient.medical_history.join(", ")
        ));
    }

    if patient.medications.is_empty() {
        parts.push("Current Medications: None".to_string());
    } else {
        parts.push(format!(
            "Current Medications: {}",
            patient.medications.join(", ")
        ));
    }

    if patient.allergies.is_empty() {
        parts.push("Allergies: NKDA (No Known Drug Allergies)".to_string());
    } else {
        parts.push(format!("{ALLERGY_MARKER} {}", patient.allergies.join(", ")));
    }

    if let Some(vitals) = &patient.vitals {
        let mut rendered = Vec::new();
        if let Some(bp) = vitals.blood_pressure.as_deref().filter(|s| !s.is_empty()) {
            rendered.push(format!("BP {bp}"));
        }
        if let Some(hr) = vitals.heart_rate {
            rendered.push(format!("HR {hr}"));
        }
        if let Some(temp) = vitals.temperature {
            rendered.push(format!("Temp {temp}°F"));
        }
        if let Some(spo2) = vitals.oxygen_saturation {
            rendered.push(format!("SpO2 {spo2}%"));
        }
        if let Some(rr) = vitals.respiratory_rate {
            rendered.push(format!("RR {rr}"));
        }
        if !rendered.is_empty() {
            parts.push(format!("Baseline Vitals: {}", rendered.join(", ")));
        }
    }

    parts.join("\n")
}

/// Render the clinical presentation block from the encounter form.
pub fn form_summary(form: &EncounterForm) -> String {
    let mut parts = Vec::new();

    parts.push(format!(
        "Chief Complaint: {}",
        form.chief_complaint.as_deref().unwrap_or("Not specified")
    ));

    if let Some(hpi) = &form.hpi {
        let mut hpi_parts = Vec::new();
        if !hpi.location.is_empty() {
            hpi_parts.push(format!("Location: {}", hpi.location.join(", ")));
        }
        if !hpi.radiation.is_empty() {
            hpi_parts.push(format!("Radiation: {}", hpi.radiation.join(", ")));
        }
        if !hpi.quality.is_empty() {
            let mut quality = hpi.quality.join(", ");
            if !hpi.quality_other.is_empty() {
                quality.push_str(&format!(" ({})", hpi.quality_other));
            }
            hpi_parts.push(format!("Quality: {quality}"));
        }
        if !hpi.duration.is_empty() {
            hpi_parts.push(format!("Duration: {}", hpi.duration));
        }
        if let Some(severity) = hpi.severity {
            hpi_parts.push(format!("Severity: {severity}/10"));
        }
        if !hpi.timing.is_empty() {
            hpi_parts.push(format!("Timing: {}", hpi.timing));
        }
        if !hpi.aggravating_factors.is_empty() {
            hpi_parts.push(format!(
                "Aggravating: {}",
                hpi.aggravating_factors.join(", ")
            ));
        }
        if !hpi.relieving_factors.is_empty() {
            hpi_parts.push(format!("Relieving: {}", hpi.relieving_factors.join(", ")));
        }
        if !hpi_parts.is_empty() {
            parts.push(format!("HPI:\n  {}", hpi_parts.join("\n  ")));
        }
    }

    if form.associated_symptoms.is_empty() {
        parts.push("Associated Symptoms: None documented".to_string());
    } else {
        parts.push(format!(
            "Associated Symptoms: {}",
            form.associated_symptoms.join(", ")
        ));
    }

    if let Some(pe) = &form.physical_exam {
        let mut pe_parts = Vec::new();
        if !pe.general.is_empty() {
            pe_parts.push(format!("General: {}", pe.general.join(", ")));
        }

        let v = &pe.vitals;
        let mut vitals = Vec::new();
        if !v.bp.is_empty() {
            vitals.push(format!("BP {}", v.bp));
        }
        if !v.hr.is_empty() {
            vitals.push(format!("HR {}", v.hr));
        }
        if !v.temp.is_empty() {
            vitals.push(format!("Temp {}", v.temp));
        }
        if !v.spo2.is_empty() {
            vitals.push(format!("SpO2 {}%", v.spo2));
        }
        if !v.rr.is_empty() {
            vitals.push(format!("RR {}", v.rr));
        }
        if !vitals.is_empty() {
            pe_parts.push(format!("Vitals: {}", vitals.join(", ")));
        }

        if !pe.cardiovascular.is_empty() {
            pe_parts.push(format!("CV: {}", pe.cardiovascular.join(", ")));
        }
        if !pe.respiratory.is_empty() {
            pe_parts.push(format!("Resp: {}", pe.respiratory.join(", ")));
        }
        if !pe_parts.is_empty() {
            parts.push(format!("Physical Exam:\n  {}", pe_parts.join("\n  ")));
        }
    }

    if let Some(notes) = form.doctor_notes.as_deref().filter(|s| !s.is_empty()) {
        parts.push(format!("Clinical Notes: {notes}"));
    }

    parts.join("\n")
}

/// Render retrieved patterns with relevance scores for the grounded prompt.
pub fn render_patterns(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return "No relevant clinical patterns found.".to_string();
    }

    let rendered: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, scored)| {
            format!(
                "[Pattern {}] (Relevance: {:.2})\n{}",
                i + 1,
                scored.score,
                scored.chunk.text
            )
        })
        .collect();

    rendered.join("\n\n---\n\n")
}

/// Assemble the full grounded generation prompt.
pub fn build_grounded_prompt(
    form: &EncounterForm,
    patient: &PatientContext,
    retrieved: &[ScoredChunk],
) -> String {
    let allergies = if patient.allergies.is_empty() {
        "None known".to_string()
    } else {
        patient.allergies.join(", ")
    };

    format!(
        "Analyze this patient presentation and generate a comprehensive clinical analysis.\n\n\
         ## PATIENT INFORMATION\n{}\n\n\
         ## CLINICAL PRESENTATION\n{}\n\n\
         ## RELEVANT CLINICAL PATTERNS FROM KNOWLEDGE BASE\n{}\n\n\
         ## REQUIRED OUTPUT\n{}\n\n\
         IMPORTANT:\n\
         - Generate 3-5 differential diagnoses ranked by likelihood\n\
         - Include at least 2-4 ICD-10 codes\n\
         - Distribute tasks across immediate (STAT), urgent (today), and routine categories\n\
         - {ALLERGY_SAFETY_RULE}; reference patient allergies ({allergies}) when recommending medications\n\
         - Use the clinical patterns from the knowledge base as examples but adapt to this specific patient",
        patient_summary(patient),
        form_summary(form),
        render_patterns(retrieved),
        OUTPUT_SCHEMA,
    )
}

/// Assemble the simplified, retrieval-free fallback prompt.
pub fn build_fallback_prompt(form: &EncounterForm, patient: &PatientContext) -> String {
    format!(
        "Analyze this patient and generate clinical analysis.\n\n\
         ## PATIENT\n{}\n\n\
         ## PRESENTATION\n{}\n\n\
         ## OUTPUT (JSON)\n{}\n\n\
         IMPORTANT: {ALLERGY_SAFETY_RULE}.",
        patient_summary(patient),
        form_summary(form),
        OUTPUT_SCHEMA,
    )
}
