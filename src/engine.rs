use std::sync::{Arc, Mutex, RwLock};

use crate::config::RagConfig;
use crate::index::builder::build_index;
use crate::index::cache::EmbeddingCache;
use crate::index::fingerprint::fingerprint;
use crate::index::vector::SimilarityIndex;
use crate::knowledge::extractor::extract_chunks;
use crate::knowledge::source::KnowledgeSource;
use crate::knowledge::types::Chunk;
use crate::knowledge::KnowledgeError;
use crate::providers::{EmbeddingProvider, GenerationProvider};
use crate::rag::orchestrator::AnalysisPipeline;
use crate::rag::types::{AnalysisOutcome, EncounterForm, PatientContext, ScoredChunk};

/// Everything derived from one parse of the knowledge base. Swapped
/// atomically under the state lock so readers always see a matching
/// chunk corpus and index.
struct CorpusState {
    chunks: Arc<Vec<Chunk>>,
    fingerprint: String,
    index: Option<Arc<SimilarityIndex>>,
}

impl CorpusState {
    fn empty() -> Self {
        Self {
            chunks: Arc::new(Vec::new()),
            fingerprint: String::new(),
            index: None,
        }
    }
}

/// The clinical analysis engine: knowledge-base corpus, similarity index,
/// and the generation ladder behind one handle.
///
/// All entry points take `&self`; the engine is safe to share across
/// threads. Analysis never fails — degraded states (unreadable knowledge
/// base, no index, provider outages) shift the output down the ladder
/// instead of surfacing as errors.
pub struct ClinicalRagEngine {
    config: RagConfig,
    embedder: Box<dyn EmbeddingProvider>,
    generator: Box<dyn GenerationProvider>,
    cache: EmbeddingCache,
    state: RwLock<CorpusState>,
    // Serializes reload/rebuild so concurrent refreshes don't duplicate
    // embedding work. Readers are never blocked by it.
    rebuild: Mutex<()>,
}

impl ClinicalRagEngine {
    /// Create an engine in the empty state. Call [`initialize`] to load
    /// the knowledge base and build the index.
    ///
    /// [`initialize`]: ClinicalRagEngine::initialize
    pub fn new(
        config: RagConfig,
        embedder: Box<dyn EmbeddingProvider>,
        generator: Box<dyn GenerationProvider>,
    ) -> Self {
        let cache = EmbeddingCache::new(&config.cache_dir);
        Self {
            config,
            embedder,
            generator,
            cache,
            state: RwLock::new(CorpusState::empty()),
            rebuild: Mutex::new(()),
        }
    }

    /// Load the knowledge base, extract chunks, and build the index.
    ///
    /// An unreadable or malformed knowledge base returns the error but
    /// leaves the engine usable: analysis still works through the
    /// fallback path.
    pub fn initialize(&self) -> Result<(), KnowledgeError> {
        self.refresh()
    }

    /// Re-read the knowledge base and rebuild the index if its content
    /// fingerprint changed. No-op when the content is unchanged.
    pub fn refresh(&self) -> Result<(), KnowledgeError> {
        let _guard = self.rebuild.lock().unwrap_or_else(|e| e.into_inner());

        let source = match KnowledgeSource::load(&self.config.knowledge_base_path) {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(
                    path = %self.config.knowledge_base_path.display(),
                    error = %e,
                    "Failed to load knowledge base — engine will run without retrieval"
                );
                return Err(e);
            }
        };

        let fp = fingerprint(&source.raw);
        {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            if state.fingerprint == fp && state.index.is_some() {
                tracing::debug!("Knowledge base unchanged — keeping current index");
                return Ok(());
            }
        }

        let chunks = extract_chunks(&source.document);
        tracing::info!(chunks = chunks.len(), "Extracted knowledge base chunks");

        let index = build_index(&chunks, self.embedder.as_ref(), &self.cache, &fp).map(Arc::new);
        if index.is_none() {
            tracing::warn!("No similarity index available — retrieval disabled");
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = CorpusState {
            chunks: Arc::new(chunks),
            fingerprint: fp,
            index,
        };
        Ok(())
    }

    /// Whether a similarity index is currently available.
    pub fn index_ready(&self) -> bool {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.index.is_some()
    }

    /// Number of chunks in the current corpus.
    pub fn chunk_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.chunks.len()
    }

    /// Retrieve the most relevant knowledge-base patterns for an ad-hoc
    /// query string. Empty when no index is available.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<ScoredChunk> {
        let (chunks, index) = self.snapshot();
        crate::rag::retrieval::retrieve(
            query,
            top_k,
            self.embedder.as_ref(),
            index.as_deref(),
            &chunks,
        )
    }

    /// Generate a full clinical analysis for an encounter. Infallible:
    /// every failure mode degrades down the generation ladder.
    pub fn generate_analysis(
        &self,
        form: &EncounterForm,
        patient: &PatientContext,
    ) -> AnalysisOutcome {
        let (chunks, index) = self.snapshot();
        let pipeline = AnalysisPipeline::new(
            &self.embedder,
            &self.generator,
            index.as_deref(),
            &chunks,
            self.config.top_k,
        );
        pipeline.generate(form, patient)
    }

    fn snapshot(&self) -> (Arc<Vec<Chunk>>, Option<Arc<SimilarityIndex>>) {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        (Arc::clone(&state.chunks), state.index.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MockEmbedder, ProviderError};
    use crate::rag::types::GenerationPath;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedGenerator {
        response: String,
    }

    impl GenerationProvider for FixedGenerator {
        fn generate(&self, _system: &str, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.response.clone())
        }
    }

    struct DownGenerator;

    impl GenerationProvider for DownGenerator {
        fn generate(&self, _system: &str, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Connection("connection refused".into()))
        }
    }

    /// Embedder that counts embed_batch calls, for cache-hit assertions.
    /// The counter is shared so tests keep a handle after boxing.
    struct CountingEmbedder {
        inner: MockEmbedder,
        batch_calls: Arc<AtomicUsize>,
    }

    impl CountingEmbedder {
        fn new(dimension: usize) -> (Self, Arc<AtomicUsize>) {
            let batch_calls = Arc::new(AtomicUsize::new(0));
            let embedder = Self {
                inner: MockEmbedder::new(dimension),
                batch_calls: Arc::clone(&batch_calls),
            };
            (embedder, batch_calls)
        }
    }

    impl EmbeddingProvider for CountingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            self.inner.embed(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed_batch(texts)
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    fn sample_kb_json() -> &'static str {
        r#"{
            "patient": {
                "id": 1,
                "mrn": "MRN-2024-001",
                "name": "Maria Garcia",
                "age": 58,
                "gender": "Female",
                "allergies": ["Penicillin"],
                "medical_history": ["Hypertension"]
            },
            "scenarios": [
                {
                    "id": "cardiac-01",
                    "name": "Chest Pain - Cardiac",
                    "form_data": {
                        "chief_complaint": "Chest pain radiating to left arm",
                        "associated_symptoms": ["Diaphoresis", "Nausea"],
                        "hpi": {
                            "location": ["Substernal"],
                            "quality": ["Pressure"],
                            "severity": 8,
                            "duration": "45 minutes"
                        },
                        "doctor_notes": "Patient appears distressed."
                    }
                }
            ],
            "api_responses": {
                "cardiac": {
                    "clinical_note": "SUBJECTIVE: 58yo F with substernal chest pain. OBJECTIVE: Diaphoretic, BP 160/95. ASSESSMENT: Concern for ACS. PLAN: ECG, troponin, aspirin.",
                    "differential_diagnoses": [
                        {"diagnosis": "Acute coronary syndrome", "risk_level": "High", "rank": 1}
                    ],
                    "tasks": {
                        "immediate_tasks": [
                            {"task": "12-lead ECG", "category": "Diagnostics", "reason": "Rule out STEMI"}
                        ],
                        "urgent_tasks": [],
                        "routine_tasks": []
                    },
                    "icd10_codes": [
                        {"code": "I20.0", "description": "Unstable angina", "type": "primary"}
                    ]
                }
            }
        }"#
    }

    fn write_kb(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
        let path = dir.join("patients-data.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn valid_response() -> String {
        r#"{
            "clinical_note": {"subjective": "s", "objective": "o", "assessment": "a", "plan": "p"},
            "icd10_codes": [],
            "differential_diagnoses": [],
            "recommended_actions": {"immediate": [], "urgent": [], "routine": []}
        }"#
        .to_string()
    }

    fn engine_with(
        kb_dir: &std::path::Path,
        cache_dir: &std::path::Path,
        generator: Box<dyn GenerationProvider>,
    ) -> ClinicalRagEngine {
        let kb_path = kb_dir.join("patients-data.json");
        let config = RagConfig::new(kb_path)
            .with_cache_dir(cache_dir)
            .with_top_k(3);
        ClinicalRagEngine::new(config, Box::new(MockEmbedder::new(32)), generator)
    }

    #[test]
    fn initialize_builds_index_from_knowledge_base() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), sample_kb_json());

        let engine = engine_with(
            dir.path(),
            &dir.path().join("cache"),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        engine.initialize().unwrap();

        assert!(engine.index_ready());
        assert!(engine.chunk_count() > 0);
    }

    #[test]
    fn missing_knowledge_base_degrades_without_panicking() {
        let dir = tempfile::tempdir().unwrap();

        let engine = engine_with(
            dir.path(),
            &dir.path().join("cache"),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        assert!(engine.initialize().is_err());
        assert!(!engine.index_ready());
        assert_eq!(engine.chunk_count(), 0);

        // Analysis still works, un-grounded.
        let outcome = engine.generate_analysis(
            &EncounterForm {
                chief_complaint: Some("Headache".into()),
                ..Default::default()
            },
            &PatientContext::default(),
        );
        assert_eq!(outcome.path, GenerationPath::Grounded);
        assert_eq!(outcome.patterns_used, 0);
    }

    #[test]
    fn total_provider_outage_yields_minimal_result() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), sample_kb_json());

        let engine = engine_with(dir.path(), &dir.path().join("cache"), Box::new(DownGenerator));
        engine.initialize().unwrap();

        let outcome = engine.generate_analysis(
            &EncounterForm {
                chief_complaint: Some("Chest pain".into()),
                ..Default::default()
            },
            &PatientContext::default(),
        );

        assert_eq!(outcome.path, GenerationPath::Minimal);
        assert_eq!(
            outcome.result.clinical_note.subjective,
            "Patient presents with: Chest pain"
        );
    }

    #[test]
    fn unchanged_knowledge_base_reuses_cached_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), sample_kb_json());
        let kb_path = dir.path().join("patients-data.json");
        let cache_dir = dir.path().join("cache");

        let (embedder, first_calls) = CountingEmbedder::new(32);
        let config = RagConfig::new(&kb_path).with_cache_dir(&cache_dir);
        let engine = ClinicalRagEngine::new(
            config.clone(),
            Box::new(embedder),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        engine.initialize().unwrap();
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);

        // Second engine over the same KB and cache dir: pure cache hit.
        let (embedder2, second_calls) = CountingEmbedder::new(32);
        let engine2 = ClinicalRagEngine::new(
            config,
            Box::new(embedder2),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        engine2.initialize().unwrap();

        assert!(engine2.index_ready());
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);

        // Refresh over unchanged content stays a no-op.
        engine2.refresh().unwrap();
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refresh_rebuilds_after_content_change() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), sample_kb_json());

        let engine = engine_with(
            dir.path(),
            &dir.path().join("cache"),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        engine.initialize().unwrap();
        let count_before = engine.chunk_count();

        // Remove the canned responses; corpus shrinks to scenario chunks.
        let edited: serde_json::Value = serde_json::from_str(sample_kb_json()).unwrap();
        let mut edited = edited;
        edited["api_responses"] = serde_json::json!({});
        write_kb(dir.path(), &serde_json::to_string(&edited).unwrap());

        engine.refresh().unwrap();
        assert!(engine.chunk_count() < count_before);
        assert!(engine.index_ready());
    }

    #[test]
    fn retrieve_returns_scored_patterns() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), sample_kb_json());

        let engine = engine_with(
            dir.path(),
            &dir.path().join("cache"),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        engine.initialize().unwrap();

        let results = engine.retrieve("chest pain with radiation", 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn empty_knowledge_base_initializes_without_index() {
        let dir = tempfile::tempdir().unwrap();
        write_kb(dir.path(), r#"{"scenarios": [], "api_responses": {}}"#);

        let engine = engine_with(
            dir.path(),
            &dir.path().join("cache"),
            Box::new(FixedGenerator {
                response: valid_response(),
            }),
        );
        engine.initialize().unwrap();

        assert!(!engine.index_ready());
        assert_eq!(engine.chunk_count(), 0);
        assert!(engine.retrieve("anything", 5).is_empty());
    }
}
