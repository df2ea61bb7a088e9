pub mod openai;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Embedding capability abstraction.
///
/// The same call shape serves corpus chunks at index-build time and live
/// queries at retrieval time. Batches of up to 100 inputs must be supported.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError>;
    fn dimension(&self) -> usize;
}

/// Allow `Box<dyn EmbeddingProvider>` to be used as `&impl EmbeddingProvider`.
impl EmbeddingProvider for Box<dyn EmbeddingProvider> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Generative-model capability abstraction.
///
/// Implementations may legitimately return malformed or partially populated
/// structured output; the caller is responsible for repair and fallback.
pub trait GenerationProvider: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

impl GenerationProvider for Box<dyn GenerationProvider> {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        (**self).generate(system, prompt)
    }
}

/// Mock embedding provider for testing — produces deterministic unit vectors.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(crate::config::EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        Ok(deterministic_vector(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts
            .iter()
            .map(|t| deterministic_vector(t, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Generate a deterministic unit vector from text (for testing).
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];
    let bytes = text.as_bytes();

    for (i, slot) in vec.iter_mut().enumerate() {
        let byte_idx = i % bytes.len().max(1);
        *slot = (bytes.get(byte_idx).copied().unwrap_or(0) as f32 + i as f32) / 255.0;
    }

    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut vec {
            *val /= norm;
        }
    }

    vec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_embed_returns_requested_dimension() {
        let embedder = MockEmbedder::new(16);
        let vec = embedder.embed("chest pain").unwrap();
        assert_eq!(vec.len(), 16);
    }

    #[test]
    fn mock_embed_is_deterministic() {
        let embedder = MockEmbedder::new(32);
        let v1 = embedder.embed("same text").unwrap();
        let v2 = embedder.embed("same text").unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn mock_embed_different_texts_differ() {
        let embedder = MockEmbedder::new(32);
        let v1 = embedder.embed("text A").unwrap();
        let v2 = embedder.embed("text B").unwrap();
        assert_ne!(v1, v2);
    }

    #[test]
    fn mock_embed_is_l2_normalized() {
        let embedder = MockEmbedder::new(64);
        let vec = embedder.embed("test normalization").unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "Vector should be L2-normalized, got norm = {norm}"
        );
    }

    #[test]
    fn mock_batch_matches_single_calls() {
        let embedder = MockEmbedder::new(8);
        let batch = embedder.embed_batch(&["one", "two"]).unwrap();
        assert_eq!(batch[0], embedder.embed("one").unwrap());
        assert_eq!(batch[1], embedder.embed("two").unwrap());
    }

    #[test]
    fn boxed_provider_delegates() {
        let boxed: Box<dyn EmbeddingProvider> = Box::new(MockEmbedder::new(8));
        assert_eq!(boxed.dimension(), 8);
        assert_eq!(boxed.embed("x").unwrap().len(), 8);
    }
}
