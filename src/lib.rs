pub mod config;
pub mod providers; // Embedding + generation capability seams
pub mod knowledge; // Knowledge-base loading and chunk extraction
pub mod index; // Content fingerprint, embedding cache, similarity index
pub mod rag; // Query/prompt assembly, retrieval, generation ladder
pub mod engine;

use tracing_subscriber::EnvFilter;

pub use engine::ClinicalRagEngine;
pub use rag::types::{AnalysisOutcome, AnalysisResult, EncounterForm, PatientContext};

/// Initialize tracing for binaries embedding the engine.
///
/// Respects `RUST_LOG` when set, otherwise falls back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Clinsight engine v{}", config::APP_VERSION);
}
