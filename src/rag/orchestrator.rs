use super::parser::parse_analysis;
use super::prompt::{
    build_fallback_prompt, build_grounded_prompt, FALLBACK_SYSTEM_PROMPT, GROUNDED_SYSTEM_PROMPT,
};
use super::query::build_query;
use super::retrieval::retrieve;
use super::types::{
    AnalysisOutcome, AnalysisResult, EncounterForm, GenerationPath, PatientContext,
};
use super::RagError;
use crate::index::vector::SimilarityIndex;
use crate::knowledge::types::Chunk;
use crate::providers::{EmbeddingProvider, GenerationProvider};

/// Three-tier generation ladder: GROUNDED → FALLBACK → MINIMAL.
///
/// The ladder is the resilience contract of the engine — callers always get
/// a structurally complete `AnalysisResult`, never an error, for expected
/// failure modes (provider errors, timeouts, unparsable model output).
pub struct AnalysisPipeline<'a, E: EmbeddingProvider, G: GenerationProvider> {
    embedder: &'a E,
    generator: &'a G,
    index: Option<&'a SimilarityIndex>,
    chunks: &'a [Chunk],
    top_k: usize,
}

impl<'a, E: EmbeddingProvider, G: GenerationProvider> AnalysisPipeline<'a, E, G> {
    pub fn new(
        embedder: &'a E,
        generator: &'a G,
        index: Option<&'a SimilarityIndex>,
        chunks: &'a [Chunk],
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            generator,
            index,
            chunks,
            top_k,
        }
    }

    /// Run the full ladder. Infallible by contract.
    pub fn generate(&self, form: &EncounterForm, patient: &PatientContext) -> AnalysisOutcome {
        match self.grounded(form, patient) {
            Ok((result, patterns_used)) => AnalysisOutcome {
                result,
                path: GenerationPath::Grounded,
                patterns_used,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Grounded generation failed — taking fallback path");
                match self.fallback(form, patient) {
                    Ok(result) => AnalysisOutcome {
                        result,
                        path: GenerationPath::Fallback,
                        patterns_used: 0,
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "Fallback generation failed — returning minimal result");
                        AnalysisOutcome {
                            result: minimal_result(form),
                            path: GenerationPath::Minimal,
                            patterns_used: 0,
                        }
                    }
                }
            }
        }
    }

    /// GROUNDED: retrieve relevant patterns and generate against them.
    fn grounded(
        &self,
        form: &EncounterForm,
        patient: &PatientContext,
    ) -> Result<(AnalysisResult, usize), RagError> {
        let query = build_query(form, patient);
        let retrieved = retrieve(&query, self.top_k, self.embedder, self.index, self.chunks);

        let prompt = build_grounded_prompt(form, patient, &retrieved);
        let raw = self.generator.generate(GROUNDED_SYSTEM_PROMPT, &prompt)?;

        let result = parse_analysis(&raw)?;
        tracing::info!(patterns = retrieved.len(), "Generated grounded analysis");
        Ok((result, retrieved.len()))
    }

    /// FALLBACK: simplified prompt with no retrieved context.
    fn fallback(
        &self,
        form: &EncounterForm,
        patient: &PatientContext,
    ) -> Result<AnalysisResult, RagError> {
        let prompt = build_fallback_prompt(form, patient);
        let raw = self.generator.generate(FALLBACK_SYSTEM_PROMPT, &prompt)?;
        parse_analysis(&raw)
    }
}

/// MINIMAL: the fixed last-resort result. Echoes the chief complaint into
/// the subjective section so the caller still gets a well-formed analysis.
pub fn minimal_result(form: &EncounterForm) -> AnalysisResult {
    use super::types::{ClinicalNote, RecommendedActions};

    AnalysisResult {
        clinical_note: ClinicalNote {
            subjective: format!(
                "Patient presents with: {}",
                form.chief_complaint.as_deref().unwrap_or("Unknown")
            ),
            objective: "Unable to generate - please check system logs".into(),
            assessment: "Analysis generation failed".into(),
            plan: "Please review manually".into(),
        },
        icd10_codes: vec![],
        differential_diagnoses: vec![],
        recommended_actions: RecommendedActions::default(),
    }
}
