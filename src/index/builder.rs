use super::cache::EmbeddingCache;
use super::vector::{l2_normalize, EmbeddingMatrix, SimilarityIndex};
use crate::knowledge::types::Chunk;
use crate::providers::EmbeddingProvider;

/// Provider request-size limit per embedding call.
const EMBED_BATCH_SIZE: usize = 100;

/// Build (or load from cache) the similarity index for a chunk corpus.
///
/// Returns `None` in every degraded case — empty corpus, provider failure,
/// malformed provider output. "No index" is a valid state: retrieval becomes
/// a no-op and generation still has its fallback path, so none of these are
/// fatal.
pub fn build_index(
    chunks: &[Chunk],
    embedder: &dyn EmbeddingProvider,
    cache: &EmbeddingCache,
    fingerprint: &str,
) -> Option<SimilarityIndex> {
    if chunks.is_empty() {
        tracing::info!("Empty chunk corpus — skipping index build");
        return None;
    }

    if let Some(matrix) = cache.load(fingerprint) {
        if matrix.rows() == chunks.len() {
            tracing::info!(rows = matrix.rows(), "Loaded embedding matrix from cache");
            return Some(SimilarityIndex::from_matrix(matrix));
        }
        tracing::warn!(
            cached = matrix.rows(),
            expected = chunks.len(),
            "Cached matrix row count does not match chunk count — rebuilding"
        );
    }

    tracing::info!(count = chunks.len(), "Generating embeddings for chunks");

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        match embedder.embed_batch(batch) {
            Ok(batch_vectors) => vectors.extend(batch_vectors),
            Err(e) => {
                tracing::error!(error = %e, "Embedding provider failed — index unavailable");
                return None;
            }
        }
    }

    if vectors.len() != chunks.len() {
        tracing::error!(
            got = vectors.len(),
            expected = chunks.len(),
            "Embedding count does not match chunk count — index unavailable"
        );
        return None;
    }

    let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
    if dimension == 0 || vectors.iter().any(|v| v.len() != dimension) {
        tracing::error!("Embedding dimensionality is inconsistent — index unavailable");
        return None;
    }

    for vector in &mut vectors {
        l2_normalize(vector);
    }

    let matrix = EmbeddingMatrix { dimension, vectors };

    // Cache write failure degrades to rebuild-next-start, not to no-index.
    if let Err(e) = cache.save(fingerprint, &matrix) {
        tracing::warn!(error = %e, "Failed to persist embedding cache");
    }

    tracing::info!(rows = matrix.rows(), dimension, "Built similarity index");
    Some(SimilarityIndex::from_matrix(matrix))
}
