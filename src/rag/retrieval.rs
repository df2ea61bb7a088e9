use super::types::ScoredChunk;
use crate::index::vector::SimilarityIndex;
use crate::knowledge::types::Chunk;
use crate::providers::EmbeddingProvider;

/// Retrieve the `top_k` most relevant chunks for a query.
///
/// Returns results in descending score order, at most `top_k` and at most
/// the corpus size. Degrades to an empty result — never an error — when no
/// index is available or the query embedding fails: generation has its own
/// fallback for the un-grounded case.
pub fn retrieve(
    query: &str,
    top_k: usize,
    embedder: &dyn EmbeddingProvider,
    index: Option<&SimilarityIndex>,
    chunks: &[Chunk],
) -> Vec<ScoredChunk> {
    let Some(index) = index else {
        tracing::warn!("Index not available — returning empty results");
        return Vec::new();
    };

    let query_embedding = match embedder.embed(query) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Query embedding failed — returning empty results");
            return Vec::new();
        }
    };

    let results: Vec<ScoredChunk> = index
        .search(&query_embedding, top_k)
        .into_iter()
        .filter_map(|(idx, score)| {
            chunks.get(idx).map(|chunk| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
        })
        .collect();

    tracing::debug!(count = results.len(), "Retrieved chunks for query");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::builder::build_index;
    use crate::index::cache::EmbeddingCache;
    use crate::knowledge::types::ChunkKind;
    use crate::providers::{MockEmbedder, ProviderError};

    struct FailingEmbedder;

    impl EmbeddingProvider for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Timeout(60))
        }
        fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Err(ProviderError::Timeout(60))
        }
        fn dimension(&self) -> usize {
            16
        }
    }

    fn make_chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: format!("c{i}"),
                kind: ChunkKind::ScenarioOverview,
                source_ref: "test".into(),
                text: text.to_string(),
                metadata: Default::default(),
            })
            .collect()
    }

    fn built(chunks: &[Chunk], embedder: &MockEmbedder) -> SimilarityIndex {
        let dir = tempfile::tempdir().unwrap();
        let cache = EmbeddingCache::new(dir.path());
        build_index(chunks, embedder, &cache, "fp").unwrap()
    }

    #[test]
    fn no_index_returns_empty() {
        let embedder = MockEmbedder::new(16);
        let chunks = make_chunks(&["some chunk"]);
        let results = retrieve("query", 5, &embedder, None, &chunks);
        assert!(results.is_empty());
    }

    #[test]
    fn embed_failure_returns_empty() {
        let mock = MockEmbedder::new(16);
        let chunks = make_chunks(&["a", "b"]);
        let index = built(&chunks, &mock);

        let results = retrieve("query", 5, &FailingEmbedder, Some(&index), &chunks);
        assert!(results.is_empty());
    }

    #[test]
    fn results_are_descending_and_bounded() {
        let embedder = MockEmbedder::new(16);
        let chunks = make_chunks(&[
            "chest pain with radiation",
            "abdominal pain pattern",
            "fever and headache",
            "routine followup tasks",
        ]);
        let index = built(&chunks, &embedder);

        let results = retrieve("chest pain", 3, &embedder, Some(&index), &chunks);

        assert!(results.len() <= 3);
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn k_larger_than_corpus_is_clamped() {
        let embedder = MockEmbedder::new(16);
        let chunks = make_chunks(&["one", "two"]);
        let index = built(&chunks, &embedder);

        let results = retrieve("query", 50, &embedder, Some(&index), &chunks);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn identical_text_ranks_first() {
        let embedder = MockEmbedder::new(16);
        let chunks = make_chunks(&["alpha pattern", "beta pattern", "gamma pattern"]);
        let index = built(&chunks, &embedder);

        let results = retrieve("beta pattern", 1, &embedder, Some(&index), &chunks);
        assert_eq!(results[0].chunk.id, "c1");
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }
}
