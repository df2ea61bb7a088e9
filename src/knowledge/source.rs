use std::path::Path;

use super::types::KnowledgeBase;
use super::KnowledgeError;

/// The raw knowledge-source bytes plus the parsed document.
///
/// The raw bytes are kept because they are the fingerprint input — any
/// byte-level change to the file must invalidate cached embeddings.
pub struct KnowledgeSource {
    pub raw: Vec<u8>,
    pub document: KnowledgeBase,
}

impl KnowledgeSource {
    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        let raw = std::fs::read(path)?;
        let document: KnowledgeBase = serde_json::from_slice(&raw)?;

        tracing::info!(
            path = %path.display(),
            scenarios = document.scenarios.len(),
            responses = document.api_responses.len(),
            "Loaded knowledge base"
        );

        Ok(Self { raw, document })
    }
}
